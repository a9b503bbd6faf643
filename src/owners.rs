//! Fixed owner membership and the confirmation threshold
use crate::error::ConfigError;
use crate::types::Principal;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerSet {
    owners: Vec<Principal>, // insertion order
    required: usize,
}

impl OwnerSet {
    /// Validates membership and threshold. Nothing is built on failure.
    pub fn new(owners: Vec<Principal>, required: usize) -> Result<Self, ConfigError> {
        if owners.is_empty() {
            return Err(ConfigError::NoOwners);
        }

        let mut seen = BTreeSet::new();
        for owner in &owners {
            if owner.is_zero() {
                return Err(ConfigError::ZeroOwner(owner.clone()));
            }
            if !seen.insert(owner) {
                return Err(ConfigError::DuplicateOwner(owner.clone()));
            }
        }

        if required < 1 || required > owners.len() {
            return Err(ConfigError::InvalidThreshold {
                required,
                owners: owners.len(),
            });
        }

        Ok(Self { owners, required })
    }

    pub fn is_owner(&self, principal: &Principal) -> bool {
        self.owners.contains(principal)
    }

    pub fn owners(&self) -> &[Principal] {
        &self.owners
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
