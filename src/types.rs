//! Core types for snapshots.

use crate::error::SnapshotError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Chain height at which a snapshot was observed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    pub fn next(self) -> Self {
        BlockHeight(self.0 + 1)
    }
}

impl fmt::Debug for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scalar observation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Balances, supply, price per share.
    Int(U256),
    Address(Address),
    /// Opaque text such as a strategy name.
    Text(String),
}

impl Value {
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            Value::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Value::Int(v) if v.is_zero())
    }
}

impl From<U256> for Value {
    fn from(v: U256) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(U256::from(v))
    }
}

impl From<Address> for Value {
    fn from(a: Address) -> Self {
        Value::Address(a)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Address(a) => write!(f, "{}", a),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Top-level namespace of a snapshot field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Token balance of an entity.
    Balances,
    /// Vault-level state.
    Sett,
    /// Strategy-level state.
    Strategy,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Balances => "balances",
            Category::Sett => "sett",
            Category::Strategy => "strategy",
        }
    }
}

/// Structured snapshot key.
///
/// Renders as the dotted form used in reports: `balances.<token>.<entity>`,
/// `sett.<field>` or `strategy.<field>`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey {
    pub category: Category,
    /// Token name for balances, field name otherwise.
    pub field: String,
    /// Entity alias, only present for balances.
    pub entity: Option<String>,
}

impl SnapshotKey {
    pub fn balance(token: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            category: Category::Balances,
            field: token.into(),
            entity: Some(entity.into()),
        }
    }

    pub fn sett(field: impl Into<String>) -> Self {
        Self {
            category: Category::Sett,
            field: field.into(),
            entity: None,
        }
    }

    pub fn strategy(field: impl Into<String>) -> Self {
        Self {
            category: Category::Strategy,
            field: field.into(),
            entity: None,
        }
    }

    pub fn is_balance(&self) -> bool {
        self.category == Category::Balances
    }

    /// Check that the key renders to a dotted form that parses back to it.
    ///
    /// Parts must be non-empty and dot-free, and only balance keys carry an
    /// entity.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let entity_ok = match (&self.entity, self.category) {
            (Some(entity), Category::Balances) => is_key_part(entity),
            (None, Category::Sett | Category::Strategy) => true,
            _ => false,
        };
        if entity_ok && is_key_part(&self.field) {
            Ok(())
        } else {
            Err(SnapshotError::InvalidKey(self.to_string()))
        }
    }
}

/// True if `part` can sit between the dots of a rendered key.
pub fn is_key_part(part: &str) -> bool {
    !part.is_empty() && !part.contains('.')
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entity {
            Some(entity) => write!(f, "{}.{}.{}", self.category.as_str(), self.field, entity),
            None => write!(f, "{}.{}", self.category.as_str(), self.field),
        }
    }
}

impl fmt::Debug for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotKey({})", self)
    }
}

impl FromStr for SnapshotKey {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(SnapshotError::InvalidKey(s.to_string()));
        }
        match parts.as_slice() {
            ["balances", token, entity] => Ok(SnapshotKey::balance(*token, *entity)),
            ["sett", field] => Ok(SnapshotKey::sett(*field)),
            ["strategy", field] => Ok(SnapshotKey::strategy(*field)),
            _ => Err(SnapshotError::InvalidKey(s.to_string())),
        }
    }
}

impl Serialize for SnapshotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnapshotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Vault classification from the protocol system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SettType {
    #[default]
    Default,
    /// Vault over a rebasing token; amounts are also tracked as shares.
    Digg,
}

/// Parameters handed to a resolver's confirmation step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionParams {
    pub user: Address,
    /// Amount moved; absent for actions without one (earn).
    pub amount: Option<U256>,
    pub sett_type: SettType,
    /// `amount` converted to rebasing-token shares, only for `SettType::Digg`.
    ///
    /// Snapshots hold fragment balances, so confirmation only requires the
    /// share amount to be recorded and non-zero; it is kept for callers that
    /// reconcile across rebases.
    pub shares: Option<U256>,
}

/// Signed difference `after - before` of two observations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delta {
    Unchanged,
    Increase(U256),
    Decrease(U256),
    /// At least one side is not an integer.
    NotNumeric,
}

impl Delta {
    pub fn between(before: &Value, after: &Value) -> Self {
        match (before.as_uint(), after.as_uint()) {
            (Some(a), Some(b)) if b > a => Delta::Increase(b - a),
            (Some(a), Some(b)) if b < a => Delta::Decrease(a - b),
            (Some(_), Some(_)) => Delta::Unchanged,
            _ => Delta::NotNumeric,
        }
    }

    /// Magnitude of the change, if numeric.
    pub fn magnitude(&self) -> Option<U256> {
        match self {
            Delta::Unchanged => Some(U256::ZERO),
            Delta::Increase(v) | Delta::Decrease(v) => Some(*v),
            Delta::NotNumeric => None,
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Unchanged => write!(f, "0"),
            Delta::Increase(v) => write!(f, "{}", v),
            Delta::Decrease(v) => write!(f, "-{}", v),
            Delta::NotNumeric => write!(f, "-"),
        }
    }
}
