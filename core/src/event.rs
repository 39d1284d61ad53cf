use crate::{
    ambient::WeatherCondition,
    growth::GrowthStage,
    stats::PetStats,
    types::{EpochMillis, SessionId},
};
use serde::{Deserialize, Serialize};

/// Every externally observable thing the session does.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PetEvent {
    SessionResumed {
        at: EpochMillis,
        /// None when the save had no usable growth timestamp.
        offline_ms: Option<i64>,
    },

    // ── Growth ──────────────────────────────────────────────────
    GrowthChecked {
        at: EpochMillis,
        elapsed_days: u64,
        age_in_days: u64,
    },

    StageEvolved {
        at: EpochMillis,
        from: GrowthStage,
        to: GrowthStage,
        age_in_days: u64,
    },

    MilestoneUnlocked {
        at: EpochMillis,
        milestone: String,
    },

    // ── Ambient ─────────────────────────────────────────────────
    AmbientUpdated {
        at: EpochMillis,
        hour: u32,
        weather: WeatherCondition,
    },

    // ── Stats ───────────────────────────────────────────────────
    StatsDecayed {
        at: EpochMillis,
        multiplier: f64,
        stats: PetStats,
    },

    SessionSaved {
        at: EpochMillis,
    },
}

impl PetEvent {
    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionResumed { .. }    => "session_resumed",
            Self::GrowthChecked { .. }     => "growth_checked",
            Self::StageEvolved { .. }      => "stage_evolved",
            Self::MilestoneUnlocked { .. } => "milestone_unlocked",
            Self::AmbientUpdated { .. }    => "ambient_updated",
            Self::StatsDecayed { .. }      => "stats_decayed",
            Self::SessionSaved { .. }      => "session_saved",
        }
    }

    /// Owning subsystem, for the subsystem column in event_log.
    pub fn subsystem(&self) -> &'static str {
        match self {
            Self::GrowthChecked { .. }
            | Self::StageEvolved { .. }
            | Self::MilestoneUnlocked { .. } => "growth",
            Self::AmbientUpdated { .. }      => "ambient",
            Self::StatsDecayed { .. }        => "stat_decay",
            Self::SessionResumed { .. }
            | Self::SessionSaved { .. }      => "session",
        }
    }

    pub fn at(&self) -> EpochMillis {
        match self {
            Self::SessionResumed { at, .. }
            | Self::GrowthChecked { at, .. }
            | Self::StageEvolved { at, .. }
            | Self::MilestoneUnlocked { at, .. }
            | Self::AmbientUpdated { at, .. }
            | Self::StatsDecayed { at, .. }
            | Self::SessionSaved { at } => *at,
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub session_id: SessionId,
    pub at_ms: EpochMillis,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized PetEvent
}

impl EventLogEntry {
    pub fn from_event(session_id: &str, event: &PetEvent) -> serde_json::Result<Self> {
        Ok(Self {
            id:         None,
            session_id: session_id.to_string(),
            at_ms:      event.at(),
            subsystem:  event.subsystem().to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        })
    }
}
