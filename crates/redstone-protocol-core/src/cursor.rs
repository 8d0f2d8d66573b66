//! Backward cursor over a byte buffer.
//!
//! Payloads are located by their distance from the end of a buffer, because
//! their start position inside a larger blob is unknown. The cursor only
//! consumes from the tail; there is no forward indexing.

use crate::codec::read_uint;
use crate::error::{CoreError, Result};

/// A cursor that consumes a buffer from its end towards its start.
#[derive(Debug, Clone, Copy)]
pub struct TailCursor<'a> {
    buf: &'a [u8],
    end: usize,
}

impl<'a> TailCursor<'a> {
    /// Start at the very end of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            end: buf.len(),
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.end
    }

    /// Bytes consumed so far, counted from the end.
    pub fn consumed(&self) -> usize {
        self.buf.len() - self.end
    }

    /// Consume exactly `n` bytes from the tail.
    pub fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        let start = self.end.checked_sub(n).ok_or(CoreError::TruncatedBuffer {
            field,
            needed: n,
            remaining: self.end,
        })?;
        let slice = &self.buf[start..self.end];
        self.end = start;
        Ok(slice)
    }

    /// Consume a big-endian unsigned integer of `width` bytes (max 8).
    pub fn take_uint(&mut self, width: usize, field: &'static str) -> Result<u64> {
        let bytes = self.take(width, field)?;
        Ok(read_uint(bytes))
    }

    /// Consume a count field and convert it to `usize`.
    pub fn take_count(&mut self, width: usize, field: &'static str) -> Result<usize> {
        let value = self.take_uint(width, field)?;
        usize::try_from(value).map_err(|_| CoreError::TruncatedBuffer {
            field,
            needed: usize::MAX,
            remaining: self.end,
        })
    }

    /// Look at the last `n` unconsumed bytes without consuming them.
    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        let start = self.end.checked_sub(n)?;
        Some(&self.buf[start..self.end])
    }

    /// Fail unless `count` items of `item_len` bytes each are still available.
    ///
    /// Checked before looping, so a hostile count cannot drive allocation.
    pub fn ensure(&self, count: usize, item_len: usize, field: &'static str) -> Result<()> {
        let needed = count.checked_mul(item_len).ok_or(CoreError::TruncatedBuffer {
            field,
            needed: usize::MAX,
            remaining: self.end,
        })?;
        if needed > self.end {
            return Err(CoreError::TruncatedBuffer {
                field,
                needed,
                remaining: self.end,
            });
        }
        Ok(())
    }

    /// Everything before the consumed tail, uninterpreted.
    pub fn into_prefix(self) -> &'a [u8] {
        &self.buf[..self.end]
    }
}
