//! Point-in-time record of contract observations.

use crate::error::{Result, SnapshotError};
use crate::types::{BlockHeight, SnapshotKey, Value};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat map of observations taken at one block height.
///
/// Every value in a snapshot comes from the same batched read, so the whole
/// map reflects exactly one chain height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    data: BTreeMap<SnapshotKey, Value>,
    block: BlockHeight,
}

impl Snapshot {
    /// Wrap captured values; every key must survive a round trip through
    /// its dotted form.
    pub fn new(data: BTreeMap<SnapshotKey, Value>, block: BlockHeight) -> Result<Self> {
        for key in data.keys() {
            key.validate()?;
        }
        Ok(Self { data, block })
    }

    pub fn block(&self) -> BlockHeight {
        self.block
    }

    /// Look up a captured value.
    ///
    /// A missing key means the two sides of a comparison were captured with
    /// different field sets, so it is an error rather than a default.
    pub fn get(&self, key: &SnapshotKey) -> Result<&Value> {
        self.data.get(key).ok_or_else(|| SnapshotError::MissingKey {
            key: key.clone(),
            block: self.block,
        })
    }

    /// Integer value for `key`.
    pub fn get_uint(&self, key: &SnapshotKey) -> Result<U256> {
        self.get(key)?
            .as_uint()
            .ok_or_else(|| SnapshotError::UnexpectedValue {
                what: key.to_string(),
                expected: "integer",
            })
    }

    /// Balance of `token` held by the entity aliased `entity`.
    pub fn balance_of(&self, token: &str, entity: &str) -> Result<U256> {
        self.get_uint(&SnapshotKey::balance(token, entity))
    }

    /// Sum of `token` balances over `entities`; zero for an empty list.
    pub fn sum_balances<S: AsRef<str>>(&self, token: &str, entities: &[S]) -> Result<U256> {
        entities.iter().try_fold(U256::ZERO, |total, entity| {
            total
                .checked_add(self.balance_of(token, entity.as_ref())?)
                .ok_or_else(|| SnapshotError::Overflow(format!("sum of {} balances", token)))
        })
    }

    /// Overwrite a value. Only meant for building fixtures.
    pub fn set(&mut self, key: SnapshotKey, value: Value) -> Result<()> {
        key.validate()?;
        self.data.insert(key, value);
        Ok(())
    }

    pub fn contains(&self, key: &SnapshotKey) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &SnapshotKey> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SnapshotKey, &Value)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when both snapshots captured exactly the same fields.
    pub fn same_keys(&self, other: &Snapshot) -> bool {
        self.data.len() == other.data.len() && self.data.keys().eq(other.data.keys())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    fn sample() -> Snapshot {
        let mut data = BTreeMap::new();
        data.insert(SnapshotKey::balance("want", "strategy"), Value::from(100u64));
        data.insert(SnapshotKey::balance("want", "sett"), Value::from(25u64));
        data.insert(SnapshotKey::sett("totalSupply"), Value::from(1_000u64));
        data.insert(SnapshotKey::sett("token"), Value::Address(Address::repeat_byte(0xaa)));
        Snapshot::new(data, BlockHeight(12)).unwrap()
    }

    #[test]
    fn test_get_present_and_missing() {
        let snap = sample();
        assert_eq!(snap.get(&SnapshotKey::sett("totalSupply")).unwrap(), &Value::from(1_000u64));

        let missing = SnapshotKey::balance("want", "user");
        match snap.get(&missing) {
            Err(SnapshotError::MissingKey { key, block }) => {
                assert_eq!(key, missing);
                assert_eq!(block, BlockHeight(12));
            }
            other => panic!("expected MissingKey, got {:?}", other),
        }
    }

    #[test]
    fn test_balance_helpers() {
        let snap = sample();
        assert_eq!(snap.balance_of("want", "strategy").unwrap(), U256::from(100));
        assert_eq!(snap.sum_balances("want", &["strategy", "sett"]).unwrap(), U256::from(125));
        assert_eq!(snap.sum_balances::<&str>("want", &[]).unwrap(), U256::ZERO);
        assert!(snap.sum_balances("want", &["strategy", "user"]).is_err());
    }

    #[test]
    fn test_non_integer_balance_is_rejected() {
        let snap = sample();
        assert!(matches!(
            snap.get_uint(&SnapshotKey::sett("token")),
            Err(SnapshotError::UnexpectedValue { .. })
        ));
    }

    #[test]
    fn test_sum_balances_overflow_is_an_error() {
        let mut snap = sample();
        snap.set(SnapshotKey::balance("want", "whale"), Value::Int(U256::MAX)).unwrap();
        assert!(matches!(
            snap.sum_balances("want", &["whale", "sett"]),
            Err(SnapshotError::Overflow(_))
        ));
        assert_eq!(snap.sum_balances("want", &["whale"]).unwrap(), U256::MAX);
    }

    #[test]
    fn test_dotted_keys_rejected() {
        let mut data = BTreeMap::new();
        data.insert(SnapshotKey::balance("want", "user.1"), Value::from(5u64));
        assert!(matches!(
            Snapshot::new(data, BlockHeight(3)),
            Err(SnapshotError::InvalidKey(_))
        ));

        let mut snap = sample();
        assert!(snap.set(SnapshotKey::balance("a.b", "c"), Value::from(1u64)).is_err());
        assert!(!snap.contains(&SnapshotKey::balance("a.b", "c")));
    }

    #[test]
    fn test_json_roundtrip() {
        let snap = sample();
        let json = snap.to_json().unwrap();
        assert!(json.contains("balances.want.strategy"));
        assert_eq!(Snapshot::from_json(&json).unwrap(), snap);
    }
}
