//! The pet session — owns every engine for one pet.
//!
//! EXECUTION ORDER on each pump (fixed, documented, never reordered):
//!   1. Growth      (age / stage reconciliation)
//!   2. Ambient     (hour + weather refresh)
//!   3. Stat decay  (reads the growth multiplier AFTER step 1)
//!
//! RULES:
//!   - Engines never read the clock; `now` is passed into every call.
//!   - Engines do not know about each other. Only the session moves a
//!     value (the stat multiplier) from one to another.
//!   - All randomness flows through the RngBank.
//!   - Every state change surfaces as a PetEvent.

use crate::{
    achievement::{AchievementSink, MilestoneTracker},
    ambient::AmbientTimeEngine,
    config::PetConfig,
    event::PetEvent,
    growth::{GrowthAdvance, GrowthStage, GrowthStageEngine},
    rng::{RngBank, SubsystemSlot},
    scheduler::Scheduler,
    snapshot::{SaveSnapshot, SNAPSHOT_VERSION},
    stats::{CareAction, PetStats, StatDecay},
    types::{to_millis, SessionId},
};
use chrono::{DateTime, Utc};

pub struct PetSession {
    pub session_id: SessionId,
    seed:           u64,
    config:         PetConfig,
    scheduler:      Scheduler,
    growth:         GrowthStageEngine,
    ambient:        AmbientTimeEngine,
    stats:          StatDecay,
    milestones:     MilestoneTracker,
    // Host-side achievement hook, told about the same adult arrival.
    observer:       Option<Box<dyn AchievementSink>>,
}

impl PetSession {
    /// A brand-new pet: baby, age 0, ambient seeded with one tick.
    pub fn new(session_id: SessionId, seed: u64, config: PetConfig, now: DateTime<Utc>) -> Self {
        let mut session = Self::assemble(session_id, seed, config, now);
        session.ambient.tick(now);
        log::info!("session {}: new pet (seed={seed})", session.session_id);
        session
    }

    /// Rebuild a session from a persisted blob and catch up on the time
    /// spent closed. Returns the session and the events the catch-up fired.
    pub fn resume(
        session_id: SessionId,
        seed: u64,
        config: PetConfig,
        saved: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> (Self, Vec<PetEvent>) {
        Self::resume_with_sink(session_id, seed, config, saved, now, None)
    }

    /// `resume`, with the extra achievement sink attached before catch-up
    /// so an adult arrival during it reaches the sink too.
    pub fn resume_with_sink(
        session_id: SessionId,
        seed: u64,
        config: PetConfig,
        saved: &serde_json::Value,
        now: DateTime<Utc>,
        sink: Option<Box<dyn AchievementSink>>,
    ) -> (Self, Vec<PetEvent>) {
        let snapshot = SaveSnapshot::from_value(saved);
        let mut session = Self::assemble(session_id, seed, config, now);
        session.observer = sink;
        let at = to_millis(now);

        let offline_ms = snapshot
            .growth
            .last_check_timestamp
            .map(|last| at.saturating_sub(last));
        let mut events = vec![PetEvent::SessionResumed { at, offline_ms }];

        session.milestones = MilestoneTracker::from_unlocked(snapshot.milestones);
        session.stats.restore(snapshot.stats);

        let advance = session.growth.load_snapshot(&snapshot.growth, now);
        session.record_growth(advance, now, &mut events);

        let ambient = session.ambient.load_snapshot(&snapshot.ambient, now);
        events.push(PetEvent::AmbientUpdated {
            at,
            hour: ambient.current_hour,
            weather: ambient.current_weather,
        });

        log::info!(
            "session {}: resumed as {} age={}d (offline {:?}ms)",
            session.session_id,
            session.growth.current_stage(),
            session.growth.age_in_days(),
            offline_ms
        );
        (session, events)
    }

    fn assemble(session_id: SessionId, seed: u64, config: PetConfig, now: DateTime<Utc>) -> Self {
        let bank = RngBank::new(seed);
        let growth = GrowthStageEngine::new(now, config.growth_interval());
        let ambient = AmbientTimeEngine::new(
            config.utc_offset(),
            config.weather.clone(),
            bank.for_subsystem(SubsystemSlot::Ambient),
            config.ambient_interval(),
        );
        let stats = StatDecay::new(config.stats.clone(), config.stat_decay_interval());
        Self {
            session_id,
            seed,
            config,
            scheduler: Scheduler::new(),
            growth,
            ambient,
            stats,
            milestones: MilestoneTracker::new(),
            observer: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &PetConfig {
        &self.config
    }

    pub fn growth(&self) -> &GrowthStageEngine {
        &self.growth
    }

    pub fn ambient(&self) -> &AmbientTimeEngine {
        &self.ambient
    }

    pub fn stats(&self) -> PetStats {
        self.stats.stats()
    }

    pub fn milestones(&self) -> &MilestoneTracker {
        &self.milestones
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn care(&mut self, action: CareAction) -> PetStats {
        self.stats.apply_care(action)
    }

    /// Forward adult arrivals to an extra sink (platform achievements and
    /// the like). Replaces any sink set before.
    pub fn set_achievement_sink(&mut self, sink: Box<dyn AchievementSink>) {
        self.observer = Some(sink);
    }

    /// Arm every engine's trigger. Calling it again restarts them.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.growth.start(&mut self.scheduler, now);
        self.ambient.start(&mut self.scheduler, now);
        self.stats.start(&mut self.scheduler, now);
        log::debug!("session {}: started", self.session_id);
    }

    /// Disarm every trigger. Safe when never started.
    pub fn stop(&mut self) {
        self.growth.stop(&mut self.scheduler);
        self.ambient.stop(&mut self.scheduler);
        self.stats.stop(&mut self.scheduler);
        log::debug!("session {}: stopped", self.session_id);
    }

    pub fn is_running(&self) -> bool {
        self.growth.is_running() || self.ambient.is_running() || self.stats.is_running()
    }

    /// Run whatever is due at `now`, in the documented order.
    pub fn pump(&mut self, now: DateTime<Utc>) -> Vec<PetEvent> {
        let fired = self.scheduler.poll(now);
        let mut events = Vec::new();
        if fired.is_empty() {
            return events;
        }
        let at = to_millis(now);

        if self.growth.fired(&fired) {
            let advance = self.growth.tick(now);
            self.record_growth(advance, now, &mut events);
        }

        if self.ambient.fired(&fired) {
            let state = self.ambient.tick(now);
            events.push(PetEvent::AmbientUpdated {
                at,
                hour: state.current_hour,
                weather: state.current_weather,
            });
        }

        if self.stats.fired(&fired) {
            let multiplier = self.growth.stat_multiplier();
            let stats = self.stats.tick(multiplier);
            events.push(PetEvent::StatsDecayed { at, multiplier, stats });
        }

        events
    }

    /// The persistable projection of every engine.
    pub fn save(&self) -> SaveSnapshot {
        SaveSnapshot {
            version:    SNAPSHOT_VERSION,
            growth:     self.growth.snapshot(),
            ambient:    self.ambient.snapshot(),
            stats:      self.stats.stats(),
            milestones: self.milestones.unlocked().to_vec(),
        }
    }

    fn record_growth(
        &mut self,
        advance: Option<GrowthAdvance>,
        now: DateTime<Utc>,
        events: &mut Vec<PetEvent>,
    ) {
        let Some(advance) = advance else { return };
        let at = to_millis(now);
        events.push(PetEvent::GrowthChecked {
            at,
            elapsed_days: advance.elapsed_days,
            age_in_days: advance.age_in_days,
        });

        if let Some(change) = advance.evolution {
            events.push(PetEvent::StageEvolved {
                at,
                from: change.from,
                to: change.to,
                age_in_days: change.age_in_days,
            });
            if change.to != GrowthStage::Adult {
                return;
            }
            if let Some(observer) = self.observer.as_mut() {
                observer.on_stage_reached(change.to, change.at);
            }
            if let Some(milestone) = self.milestones.on_stage_reached(change.to, change.at) {
                events.push(PetEvent::MilestoneUnlocked {
                    at,
                    milestone: milestone.to_string(),
                });
            }
        }
    }
}
