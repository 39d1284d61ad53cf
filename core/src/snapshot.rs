//! Save snapshot — the payload this core hands to the persistence layer.
//!
//! Restoring is lenient by contract: every section and every field is
//! read on its own, and anything absent or malformed falls back to a
//! default. Loading a save never fails.

use crate::{ambient::AmbientSnapshot, growth::GrowthSnapshot, stats::PetStats};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    pub version:    u32,
    pub growth:     GrowthSnapshot,
    pub ambient:    AmbientSnapshot,
    pub stats:      PetStats,
    pub milestones: Vec<String>,
}

impl SaveSnapshot {
    pub fn from_value(value: &Value) -> Self {
        let section = |key: &str| value.get(key).filter(|v| v.is_object());

        let milestones = value
            .get("milestones")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            version: value
                .get("version")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(SNAPSHOT_VERSION),
            growth:  section("growth").map(GrowthSnapshot::from_value).unwrap_or_default(),
            ambient: section("ambient").map(AmbientSnapshot::from_value).unwrap_or_default(),
            stats:   section("stats").map(PetStats::from_value).unwrap_or_default(),
            milestones,
        }
    }

    /// Parse a stored blob. Unparseable text is treated as an empty save.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                log::warn!("snapshot: unreadable save ({e}), starting from defaults");
                Self::from_value(&Value::Null)
            }
        }
    }
}

/// Integer read that also accepts whole, finite floats (e.g. `3.0`).
pub(crate) fn lenient_i64(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}
