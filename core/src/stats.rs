//! Well-being stats and their decay.
//!
//! The decay only READS the growth-stage multiplier it is handed; it
//! never writes growth state. Stats decay while the session runs and
//! do not catch up retroactively on resume.

use crate::{
    config::StatDecayConfig,
    scheduler::{RecurringTrigger, Scheduler, TaskId},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PetStats {
    pub hunger:      f64,
    pub energy:      f64,
    pub happiness:   f64,
    pub cleanliness: f64,
}

impl Default for PetStats {
    fn default() -> Self {
        Self {
            hunger:      100.0,
            energy:      100.0,
            happiness:   100.0,
            cleanliness: 100.0,
        }
    }
}

impl PetStats {
    /// Lenient restore: any missing or non-numeric stat starts full.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let full = Self::default();
        let read = |key: &str, fallback: f64| {
            value
                .get(key)
                .and_then(serde_json::Value::as_f64)
                .filter(|v| v.is_finite())
                .unwrap_or(fallback)
        };
        Self {
            hunger:      read("hunger", full.hunger),
            energy:      read("energy", full.energy),
            happiness:   read("happiness", full.happiness),
            cleanliness: read("cleanliness", full.cleanliness),
        }
    }

    fn clamp(&mut self, floor: f64, ceiling: f64) {
        self.hunger = self.hunger.clamp(floor, ceiling);
        self.energy = self.energy.clamp(floor, ceiling);
        self.happiness = self.happiness.clamp(floor, ceiling);
        self.cleanliness = self.cleanliness.clamp(floor, ceiling);
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CareAction {
    Feed,
    Rest,
    Play,
    Clean,
}

impl std::str::FromStr for CareAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feed"  => Ok(Self::Feed),
            "rest"  => Ok(Self::Rest),
            "play"  => Ok(Self::Play),
            "clean" => Ok(Self::Clean),
            other   => Err(format!("unknown care action '{other}'")),
        }
    }
}

#[derive(Debug)]
pub struct StatDecay {
    stats:    PetStats,
    config:   StatDecayConfig,
    interval: Duration,
    trigger:  RecurringTrigger,
}

impl StatDecay {
    pub fn new(config: StatDecayConfig, interval: Duration) -> Self {
        Self {
            stats: PetStats::default(),
            config,
            interval,
            trigger: RecurringTrigger::new(),
        }
    }

    pub fn stats(&self) -> PetStats {
        self.stats
    }

    pub fn restore(&mut self, stats: PetStats) {
        self.stats = stats;
        self.stats.clamp(self.config.floor, self.config.ceiling);
    }

    /// One decay step, each decrement scaled by `multiplier`.
    pub fn tick(&mut self, multiplier: f64) -> PetStats {
        let c = &self.config;
        self.stats.hunger -= c.hunger_per_tick * multiplier;
        self.stats.energy -= c.energy_per_tick * multiplier;
        self.stats.happiness -= c.happiness_per_tick * multiplier;
        self.stats.cleanliness -= c.cleanliness_per_tick * multiplier;
        self.stats.clamp(c.floor, c.ceiling);
        self.stats
    }

    pub fn apply_care(&mut self, action: CareAction) -> PetStats {
        let amount = self.config.care_amount;
        let stat = match action {
            CareAction::Feed  => &mut self.stats.hunger,
            CareAction::Rest  => &mut self.stats.energy,
            CareAction::Play  => &mut self.stats.happiness,
            CareAction::Clean => &mut self.stats.cleanliness,
        };
        *stat += amount;
        self.stats.clamp(self.config.floor, self.config.ceiling);
        log::debug!("stats: care {action:?} -> {:?}", self.stats);
        self.stats
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
