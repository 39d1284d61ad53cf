//! Milestone tracking fed by growth evolutions.

use crate::growth::GrowthStage;
use chrono::{DateTime, Utc};

pub const REACHED_ADULT: &str = "reached_adult";

/// Receives stage arrivals from the session.
pub trait AchievementSink {
    /// Returns the milestone id if this call unlocked something new.
    fn on_stage_reached(&mut self, stage: GrowthStage, at: DateTime<Utc>) -> Option<&'static str>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MilestoneTracker {
    unlocked: Vec<String>,
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted ids. Duplicates are dropped.
    pub fn from_unlocked<I: IntoIterator<Item = String>>(ids: I) -> Self {
        let mut tracker = Self::new();
        for id in ids {
            if !tracker.is_unlocked(&id) {
                tracker.unlocked.push(id);
            }
        }
        tracker
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|u| u == id)
    }

    pub fn unlocked(&self) -> &[String] {
        &self.unlocked
    }
}

impl AchievementSink for MilestoneTracker {
    fn on_stage_reached(&mut self, stage: GrowthStage, at: DateTime<Utc>) -> Option<&'static str> {
        if stage != GrowthStage::Adult || self.is_unlocked(REACHED_ADULT) {
            return None;
        }
        self.unlocked.push(REACHED_ADULT.to_string());
        log::info!("achievement: {REACHED_ADULT} unlocked at {at}");
        Some(REACHED_ADULT)
    }
}
