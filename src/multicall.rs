//! Batched reads keyed by snapshot field.

use crate::chain::{Call, Chain};
use crate::error::{Result, SnapshotError};
use crate::types::{BlockHeight, SnapshotKey, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Ordered list of keyed reads executed in a single round trip.
#[derive(Clone, Debug, Default)]
pub struct Multicall {
    calls: Vec<(SnapshotKey, Call)>,
}

impl Multicall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a read whose result is stored under `key`.
    pub fn push(&mut self, key: SnapshotKey, call: Call) {
        self.calls.push((key, call));
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SnapshotKey> {
        self.calls.iter().map(|(key, _)| key)
    }

    /// Run every queued read in one batch.
    ///
    /// Fails without touching the chain if two reads share a key.
    pub fn execute<C: Chain + ?Sized>(
        self,
        chain: &C,
    ) -> Result<(BlockHeight, BTreeMap<SnapshotKey, Value>)> {
        self.check_unique()?;

        let (keys, calls): (Vec<SnapshotKey>, Vec<Call>) = self.calls.into_iter().unzip();
        let result = chain.read_batch(&calls)?;

        if result.values.len() != keys.len() {
            return Err(SnapshotError::BatchMismatch {
                expected: keys.len(),
                got: result.values.len(),
            });
        }

        Ok((result.block, keys.into_iter().zip(result.values).collect()))
    }

    fn check_unique(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (key, _) in &self.calls {
            if !seen.insert(key) {
                return Err(SnapshotError::DuplicateKey(key.clone()));
            }
        }
        Ok(())
    }
}
