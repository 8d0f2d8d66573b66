//! Signer trust decisions.
//!
//! Parsing only proves who signed a payload. Whether those signers count is
//! decided here, against a registry of known signers per data service. The
//! parser never calls into this module.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use redstone_protocol_core::{CoreError, SignerAddress};

use crate::payload::{PayloadPackages, RedstonePayload};

/// Source of truth for which addresses may sign for a data service.
pub trait SignerRegistry {
    /// Whether `address` is an authorized signer for `data_service_id`.
    fn is_known_signer(&self, address: &SignerAddress, data_service_id: &str) -> bool;
}

/// In-memory registry keyed by data service id.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    services: HashMap<String, BTreeSet<SignerAddress>>,
}

impl AllowList {
    /// Create an empty allow list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize `address` for a data service.
    pub fn insert(&mut self, data_service_id: impl Into<String>, address: SignerAddress) {
        self.services
            .entry(data_service_id.into())
            .or_default()
            .insert(address);
    }

    /// Builder-style variant of [`AllowList::insert`] for several addresses.
    pub fn with_signers(
        mut self,
        data_service_id: &str,
        addresses: impl IntoIterator<Item = SignerAddress>,
    ) -> Self {
        for address in addresses {
            self.insert(data_service_id, address);
        }
        self
    }

    /// Revoke `address` for a data service. Returns whether it was present.
    pub fn remove(&mut self, data_service_id: &str, address: &SignerAddress) -> bool {
        self.services
            .get_mut(data_service_id)
            .is_some_and(|signers| signers.remove(address))
    }

    /// Authorized signers of a data service.
    pub fn signers(&self, data_service_id: &str) -> impl Iterator<Item = &SignerAddress> {
        self.services.get(data_service_id).into_iter().flatten()
    }
}

impl SignerRegistry for AllowList {
    fn is_known_signer(&self, address: &SignerAddress, data_service_id: &str) -> bool {
        self.services
            .get(data_service_id)
            .is_some_and(|signers| signers.contains(address))
    }
}

/// How many distinct known signers a payload needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerPolicy {
    pub data_service_id: String,
    pub unique_signers_threshold: usize,
}

impl SignerPolicy {
    pub fn new(data_service_id: impl Into<String>, unique_signers_threshold: usize) -> Self {
        Self {
            data_service_id: data_service_id.into(),
            unique_signers_threshold,
        }
    }
}

/// Outcome of a successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerReport {
    /// Distinct registry-known signers.
    pub authorized: BTreeSet<SignerAddress>,
    /// Recovered signers the registry does not know, in wire order.
    pub unknown: Vec<SignerAddress>,
    /// Signatures from which no address could be recovered.
    pub unrecoverable: usize,
}

/// Errors raised by trust checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    /// A package could not be serialized to compute its hash.
    #[error("cannot hash data package: {0}")]
    Core(#[from] CoreError),

    /// Fewer distinct known signers than the policy requires.
    #[error("insufficient signers for {data_service_id}: {found} of {required}")]
    InsufficientSigners {
        data_service_id: String,
        required: usize,
        found: usize,
    },
}

/// Recover every signature and check the distinct known signers against
/// the policy threshold.
///
/// Signatures that fail recovery are counted, not fatal: a cosigner with a
/// broken signature only loses its own vote.
pub fn authorize(
    payload: &RedstonePayload,
    registry: &impl SignerRegistry,
    policy: &SignerPolicy,
) -> Result<SignerReport, TrustError> {
    let mut report = SignerReport {
        authorized: BTreeSet::new(),
        unknown: Vec::new(),
        unrecoverable: 0,
    };

    let mut record = |recovered: Result<SignerAddress, CoreError>| match recovered {
        Ok(address) if registry.is_known_signer(&address, &policy.data_service_id) => {
            report.authorized.insert(address);
        }
        Ok(address) => report.unknown.push(address),
        Err(_) => report.unrecoverable += 1,
    };

    match &payload.packages {
        PayloadPackages::SingleSign(packages) => {
            for package in packages {
                let hash = package.data_package.signable_hash()?;
                record(package.signature.recover(&hash));
            }
        }
        PayloadPackages::MultiSign(package) => {
            let hash = package.signable_hash()?;
            for signature in &package.signatures {
                record(signature.recover(&hash));
            }
        }
    }

    if !report.unknown.is_empty() || report.unrecoverable > 0 {
        tracing::warn!(
            data_service_id = %policy.data_service_id,
            unknown = report.unknown.len(),
            unrecoverable = report.unrecoverable,
            "rejected payload signers"
        );
    }

    if report.authorized.len() < policy.unique_signers_threshold {
        return Err(TrustError::InsufficientSigners {
            data_service_id: policy.data_service_id.clone(),
            required: policy.unique_signers_threshold,
            found: report.authorized.len(),
        });
    }
    Ok(report)
}
