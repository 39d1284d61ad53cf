//! Growth stage engine.
//!
//! Owns the pet's age-in-days counter and its discrete growth stage.
//!
//! RULES:
//!   - `age_in_days` is the single source of truth. The stage is always
//!     recomputed from it, never incremented on its own.
//!   - Age only advances once at least one whole day has elapsed since
//!     the last check. Fractional days are discarded, not carried.
//!   - Catch-up after an idle gap is one O(1) step: a baby resumed after
//!     20 days goes straight to adult with ONE evolution, not three.
//!   - A clock that moved backwards is a no-op, never a decrement.

use crate::{
    scheduler::{RecurringTrigger, Scheduler, TaskId},
    snapshot::lenient_i64,
    types::{from_millis, to_millis, EpochMillis, ONE_DAY_MS},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Baby,
    Child,
    Teen,
    Adult,
}

impl GrowthStage {
    /// Ascending order. Thresholds are strictly increasing along it.
    pub const ALL: [GrowthStage; 4] = [Self::Baby, Self::Child, Self::Teen, Self::Adult];

    /// Minimum age (whole days) to enter this stage.
    pub fn min_age_days(&self) -> u64 {
        match self {
            Self::Baby  => 0,
            Self::Child => 3,
            Self::Teen  => 7,
            Self::Adult => 14,
        }
    }

    /// Sprite scale used by the renderer.
    pub fn size_multiplier(&self) -> f64 {
        match self {
            Self::Baby  => 0.6,
            Self::Child => 0.8,
            Self::Teen  => 0.9,
            Self::Adult => 1.0,
        }
    }

    /// Scale applied to each stat-decay decrement (>1 depletes faster).
    pub fn stat_multiplier(&self) -> f64 {
        match self {
            Self::Baby  => 1.5,
            Self::Child => 1.2,
            Self::Teen  => 1.0,
            Self::Adult => 0.8,
        }
    }

    /// Highest stage whose threshold `age_in_days` has met or exceeded.
    pub fn for_age(age_in_days: u64) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|s| age_in_days >= s.min_age_days())
            .unwrap_or(Self::Baby)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baby  => "baby",
            Self::Child => "child",
            Self::Teen  => "teen",
            Self::Adult => "adult",
        }
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrowthStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown growth stage '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrowthState {
    pub current_stage: GrowthStage,
    pub age_in_days:   u64,
    pub last_check:    DateTime<Utc>,
}

impl GrowthState {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            current_stage: GrowthStage::Baby,
            age_in_days:   0,
            last_check:    now,
        }
    }
}

/// Persisted growth fields. Every field is optional so a partial or
/// damaged save still restores whatever it can.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSnapshot {
    pub current_stage:        Option<String>,
    pub age_in_days:          Option<i64>,
    pub last_check_timestamp: Option<EpochMillis>,
}

impl GrowthSnapshot {
    /// Field-by-field extraction: a malformed field becomes None
    /// without discarding its siblings.
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self {
            current_stage: value
                .get("currentStage")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            age_in_days:          lenient_i64(value.get("ageInDays")),
            last_check_timestamp: lenient_i64(value.get("lastCheckTimestamp")),
        }
    }
}

/// A single stage transition. Emitted at most once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageChange {
    pub from:        GrowthStage,
    pub to:          GrowthStage,
    pub age_in_days: u64,
    pub at:          DateTime<Utc>,
}

/// Result of a tick that actually advanced age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthAdvance {
    pub elapsed_days: u64,
    pub age_in_days:  u64,
    pub evolution:    Option<StageChange>,
}

#[derive(Debug)]
pub struct GrowthStageEngine {
    state:    GrowthState,
    interval: Duration,
    trigger:  RecurringTrigger,
}

impl GrowthStageEngine {
    pub fn new(now: DateTime<Utc>, interval: Duration) -> Self {
        Self {
            state: GrowthState::fresh(now),
            interval,
            trigger: RecurringTrigger::new(),
        }
    }

    pub fn state(&self) -> &GrowthState {
        &self.state
    }

    pub fn current_stage(&self) -> GrowthStage {
        self.state.current_stage
    }

    pub fn age_in_days(&self) -> u64 {
        self.state.age_in_days
    }

    pub fn last_check(&self) -> DateTime<Utc> {
        self.state.last_check
    }

    pub fn size_multiplier(&self) -> f64 {
        self.state.current_stage.size_multiplier()
    }

    pub fn stat_multiplier(&self) -> f64 {
        self.state.current_stage.stat_multiplier()
    }

    /// Reconcile age and stage against `now`.
    /// Returns None when less than one whole day has elapsed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<GrowthAdvance> {
        let elapsed_ms = (now - self.state.last_check).num_milliseconds();
        if elapsed_ms < ONE_DAY_MS {
            if elapsed_ms < 0 {
                log::warn!(
                    "growth: clock is {}ms behind last check, skipping",
                    -elapsed_ms
                );
            }
            return None;
        }

        // elapsed_ms >= ONE_DAY_MS > 0, so this is a floor.
        let elapsed_days = (elapsed_ms / ONE_DAY_MS) as u64;
        self.state.age_in_days = self.state.age_in_days.saturating_add(elapsed_days);
        self.state.last_check = now;

        let target = GrowthStage::for_age(self.state.age_in_days);
        let evolution = if target != self.state.current_stage {
            Some(self.evolve(target, now))
        } else {
            None
        };

        log::debug!(
            "growth: +{elapsed_days}d age={} stage={}",
            self.state.age_in_days,
            self.state.current_stage
        );

        Some(GrowthAdvance {
            elapsed_days,
            age_in_days: self.state.age_in_days,
            evolution,
        })
    }

    /// Enter `new_stage`. The only place the stage is written after load.
    pub fn evolve(&mut self, new_stage: GrowthStage, at: DateTime<Utc>) -> StageChange {
        let from = self.state.current_stage;
        self.state.current_stage = new_stage;
        log::info!(
            "growth: evolved {from} -> {new_stage} at age {}d",
            self.state.age_in_days
        );
        StageChange {
            from,
            to: new_stage,
            age_in_days: self.state.age_in_days,
            at,
        }
    }

    /// Restore persisted fields (each defaulted on its own), then catch
    /// up through the same `tick` a live session uses.
    pub fn load_snapshot(
        &mut self,
        snapshot: &GrowthSnapshot,
        now: DateTime<Utc>,
    ) -> Option<GrowthAdvance> {
        let current_stage = match snapshot.current_stage.as_deref() {
            Some(raw) => raw.parse::<GrowthStage>().unwrap_or_else(|e| {
                log::warn!("growth: {e}, defaulting to baby");
                GrowthStage::Baby
            }),
            None => GrowthStage::Baby,
        };

        let age_in_days = match snapshot.age_in_days {
            Some(age) if age >= 0 => age as u64,
            Some(age) => {
                log::warn!("growth: negative age {age} in save, defaulting to 0");
                0
            }
            None => 0,
        };

        let last_check = snapshot
            .last_check_timestamp
            .and_then(from_millis)
            .unwrap_or(now);

        self.state = GrowthState { current_stage, age_in_days, last_check };
        self.tick(now)
    }

    pub fn snapshot(&self) -> GrowthSnapshot {
        GrowthSnapshot {
            current_stage:        Some(self.state.current_stage.as_str().to_string()),
            age_in_days:          Some(self.state.age_in_days.min(i64::MAX as u64) as i64),
            last_check_timestamp: Some(to_millis(self.state.last_check)),
        }
    }

    pub fn start(&mut self, scheduler: &mut Scheduler, now: DateTime<Utc>) {
        self.trigger.arm(scheduler, self.interval, now);
    }

    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        self.trigger.disarm(scheduler);
    }

    pub fn is_running(&self) -> bool {
        self.trigger.is_armed()
    }

    pub fn fired(&self, fired: &[TaskId]) -> bool {
        self.trigger.fired(fired)
    }
}
