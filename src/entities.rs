//! Alias → address registry of the accounts a snapshot tracks.

use crate::error::{Result, SnapshotError};
use crate::types::is_key_part;
use alloy_primitives::Address;
use std::collections::BTreeMap;

/// Protocol roles every manager tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Sett,
    Strategy,
    Controller,
    Governance,
    GovernanceRewards,
    Strategist,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Sett,
        Role::Strategy,
        Role::Controller,
        Role::Governance,
        Role::GovernanceRewards,
        Role::Strategist,
    ];

    pub fn alias(&self) -> &'static str {
        match self {
            Role::Sett => "sett",
            Role::Strategy => "strategy",
            Role::Controller => "controller",
            Role::Governance => "governance",
            Role::GovernanceRewards => "governanceRewards",
            Role::Strategist => "strategist",
        }
    }
}

/// Accounts added for a single snapshot pair, e.g. `{"user": sender}`.
pub type TrackedUsers = BTreeMap<String, Address>;

/// Ordered alias → address map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityRegistry {
    entries: BTreeMap<String, Address>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an alias.
    ///
    /// Aliases become the last part of balance keys, so they must be
    /// non-empty and dot-free.
    pub fn insert(&mut self, alias: impl Into<String>, address: Address) -> Result<()> {
        let alias = alias.into();
        check_alias(&alias)?;
        self.entries.insert(alias, address);
        Ok(())
    }

    pub fn get(&self, alias: &str) -> Option<Address> {
        self.entries.get(alias).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.entries.iter().map(|(alias, addr)| (alias.as_str(), *addr))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A copy of this registry with `tracked` laid over it.
    ///
    /// The receiver is left untouched, so per-call users never leak into the
    /// next capture.
    pub fn with_overlay(&self, tracked: &TrackedUsers) -> Result<EntityRegistry> {
        let mut merged = self.clone();
        for (alias, address) in tracked {
            merged.insert(alias.as_str(), *address)?;
        }
        Ok(merged)
    }
}

fn check_alias(alias: &str) -> Result<()> {
    if is_key_part(alias) {
        Ok(())
    } else {
        Err(SnapshotError::InvalidKey(format!("entity alias {:?}", alias)))
    }
}
