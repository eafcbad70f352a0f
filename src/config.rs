//! Manager configuration.

use crate::error::Result;
use crate::types::SnapshotKey;
use serde::{Deserialize, Serialize};

/// Decimal scale of on-chain token amounts.
pub const DEFAULT_DISPLAY_DECIMALS: u8 = 18;

/// Snapshot manager configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Decimals divided out when rendering scaled values.
    pub display_decimals: u8,

    /// Non-balance keys that are also rendered scaled.
    pub scaled_keys: Vec<SnapshotKey>,

    /// Skip zero balances in single-snapshot tables.
    pub hide_zero_balances: bool,

    /// Snapshots kept in history; 0 keeps all of them.
    pub max_history: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            display_decimals: DEFAULT_DISPLAY_DECIMALS,
            scaled_keys: vec![
                SnapshotKey::sett("available"),
                SnapshotKey::sett("pricePerFullShare"),
                SnapshotKey::sett("totalSupply"),
            ],
            hide_zero_balances: true,
            max_history: 0,
        }
    }
}

impl ManagerConfig {
    /// Parse a configuration, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
