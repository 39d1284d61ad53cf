//! Session tests: lifecycle, pump ordering, resume catch-up, save round-trip.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pet_core::{
    achievement::{AchievementSink, REACHED_ADULT},
    clock::{Clock, ManualClock},
    config::PetConfig,
    event::PetEvent,
    growth::GrowthStage,
    session::PetSession,
    stats::CareAction,
};
use serde_json::json;
use std::{cell::RefCell, rc::Rc};

/// Records every stage the session reports to it.
#[derive(Clone, Default)]
struct CountingSink {
    calls: Rc<RefCell<Vec<GrowthStage>>>,
}

impl AchievementSink for CountingSink {
    fn on_stage_reached(&mut self, stage: GrowthStage, _at: DateTime<Utc>) -> Option<&'static str> {
        self.calls.borrow_mut().push(stage);
        None
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn fresh(now: DateTime<Utc>) -> PetSession {
    PetSession::new("session-test".into(), 42, PetConfig::default_test(), now)
}

fn resume(saved: &serde_json::Value, now: DateTime<Utc>) -> (PetSession, Vec<PetEvent>) {
    PetSession::resume("session-test".into(), 42, PetConfig::default_test(), saved, now)
}

fn count(events: &[PetEvent], type_name: &str) -> usize {
    events.iter().filter(|e| e.type_name() == type_name).count()
}

#[test]
fn new_session_is_a_baby_with_ambient_seeded() {
    let session = fresh(t0());
    assert_eq!(session.growth().current_stage(), GrowthStage::Baby);
    assert_eq!(session.growth().age_in_days(), 0);
    assert_eq!(session.ambient().current_hour(), 9);
    assert_eq!(session.ambient().last_update(), Some(t0()));
    assert!(!session.is_running());
    assert!(session.milestones().unlocked().is_empty());
}

#[test]
fn start_and_stop_are_idempotent() {
    let mut session = fresh(t0());
    session.stop(); // never started

    session.start(t0());
    session.start(t0());
    assert_eq!(session.scheduler().len(), 3, "one task per engine");
    assert!(session.is_running());

    session.stop();
    session.stop();
    assert!(session.scheduler().is_empty());
    assert!(!session.is_running());
    assert!(session.pump(t0() + Duration::hours(1)).is_empty());
}

/// Within a day the growth tick is a no-op; ambient and decay still run.
#[test]
fn pump_runs_due_engines_in_order() {
    let mut session = fresh(t0());
    session.start(t0());

    assert!(session.pump(t0() + Duration::seconds(30)).is_empty());

    let events = session.pump(t0() + Duration::seconds(60));
    let kinds: Vec<&str> = events.iter().map(PetEvent::type_name).collect();
    assert_eq!(kinds, vec!["ambient_updated", "stats_decayed"]);
}

/// A running session ages exactly one day per day of pumping.
#[test]
fn live_pumping_ages_one_day_per_day() {
    let clock = ManualClock::starting_at(t0());
    let mut session = fresh(clock.now());
    session.start(clock.now());

    let mut checks = 0;
    // Three days at one-minute cadence.
    for _ in 0..(3 * 24 * 60) {
        let events = session.pump(clock.advance(Duration::seconds(60)));
        checks += count(&events, "growth_checked");
    }
    assert_eq!(checks, 3);
    assert_eq!(session.growth().age_in_days(), 3);
    assert_eq!(session.growth().current_stage(), GrowthStage::Child);
}

/// Closed for 20 days: one evolution straight to adult, one milestone.
#[test]
fn resume_catches_up_once() {
    let now = t0() + Duration::days(40);
    let saved = json!({
        "version": 1,
        "growth": {
            "currentStage": "baby",
            "ageInDays": 0,
            "lastCheckTimestamp": (now - Duration::days(20)).timestamp_millis(),
        },
        "ambient": { "lastUpdate": (now - Duration::days(20)).timestamp_millis() },
    });

    let (session, events) = resume(&saved, now);

    assert_eq!(session.growth().current_stage(), GrowthStage::Adult);
    assert_eq!(session.growth().age_in_days(), 20);
    assert_eq!(count(&events, "stage_evolved"), 1, "events: {events:?}");
    assert_eq!(count(&events, "milestone_unlocked"), 1);
    assert!(session.milestones().is_unlocked(REACHED_ADULT));

    match &events[0] {
        PetEvent::SessionResumed { offline_ms, .. } => {
            assert_eq!(*offline_ms, Some(Duration::days(20).num_milliseconds()));
        }
        other => panic!("expected SessionResumed first, got {other:?}"),
    }
    let evolved = events
        .iter()
        .find_map(|e| match e {
            PetEvent::StageEvolved { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
        .expect("evolution event");
    assert_eq!(evolved, (GrowthStage::Baby, GrowthStage::Adult));
}

/// The adult milestone is only ever unlocked once.
#[test]
fn milestone_survives_save_and_is_not_repeated() {
    let now = t0() + Duration::days(40);
    let saved = json!({
        "growth": {
            "currentStage": "teen",
            "ageInDays": 13,
            "lastCheckTimestamp": (now - Duration::days(1)).timestamp_millis(),
        },
    });
    let (session, events) = resume(&saved, now);
    assert_eq!(count(&events, "milestone_unlocked"), 1);

    let snapshot = serde_json::to_value(session.save()).unwrap();
    let later = now + Duration::days(2);
    let (again, events) = resume(&snapshot, later);
    assert_eq!(again.growth().age_in_days(), 16);
    assert_eq!(count(&events, "stage_evolved"), 0);
    assert_eq!(count(&events, "milestone_unlocked"), 0);
    assert_eq!(again.milestones().unlocked(), &[REACHED_ADULT.to_string()]);
}

/// save -> resume shortly after reproduces the pet without a transition.
#[test]
fn save_round_trip_has_no_spurious_transition() {
    let mut session = fresh(t0());
    session.start(t0());
    session.pump(t0() + Duration::days(4));
    assert_eq!(session.growth().current_stage(), GrowthStage::Child);

    let snapshot = serde_json::to_value(session.save()).unwrap();
    let (restored, events) = resume(&snapshot, t0() + Duration::days(4) + Duration::minutes(5));

    assert_eq!(restored.growth().current_stage(), GrowthStage::Child);
    assert_eq!(restored.growth().age_in_days(), 4);
    assert_eq!(count(&events, "growth_checked"), 0);
    assert_eq!(count(&events, "stage_evolved"), 0);
    assert!((restored.stats().hunger - session.stats().hunger).abs() < 1e-9);
    assert!(restored.stats().hunger < 100.0, "decayed stats were persisted");
}

/// Garbage in the save slot behaves like no save at all.
#[test]
fn resume_from_garbage_starts_fresh() {
    for saved in [json!(null), json!("corrupt"), json!({ "growth": [1, 2, 3] })] {
        let (session, events) = resume(&saved, t0());
        assert_eq!(session.growth().current_stage(), GrowthStage::Baby);
        assert_eq!(session.growth().age_in_days(), 0);
        assert_eq!(session.growth().last_check(), t0());
        let kinds: Vec<&str> = events.iter().map(PetEvent::type_name).collect();
        assert_eq!(kinds, vec!["session_resumed", "ambient_updated"]);
    }
}

/// Decay is scaled by the current stage multiplier.
#[test]
fn stat_decay_reads_stage_multiplier() {
    let mut baby = fresh(t0());
    baby.start(t0());
    let events = baby.pump(t0() + Duration::seconds(60));
    let multiplier = events
        .iter()
        .find_map(|e| match e {
            PetEvent::StatsDecayed { multiplier, .. } => Some(*multiplier),
            _ => None,
        })
        .expect("decay ran");
    assert_eq!(multiplier, GrowthStage::Baby.stat_multiplier());
    assert!((baby.stats().hunger - (100.0 - 0.5 * 1.5)).abs() < 1e-9);

    let saved = json!({
        "growth": {
            "currentStage": "adult",
            "ageInDays": 30,
            "lastCheckTimestamp": t0().timestamp_millis(),
        },
    });
    let (mut adult, _) = resume(&saved, t0());
    adult.start(t0());
    adult.pump(t0() + Duration::seconds(60));
    assert!((adult.stats().hunger - (100.0 - 0.5 * 0.8)).abs() < 1e-9);
}

/// Stats do not decay for the time the game was closed.
#[test]
fn stats_do_not_decay_retroactively() {
    let saved = json!({
        "growth": { "lastCheckTimestamp": (t0() - Duration::days(10)).timestamp_millis() },
        "stats": { "hunger": 50.0, "energy": 40.0, "happiness": 30.0, "cleanliness": "dirty" },
    });
    let (session, _) = resume(&saved, t0());
    let stats = session.stats();
    assert_eq!(stats.hunger, 50.0);
    assert_eq!(stats.energy, 40.0);
    assert_eq!(stats.happiness, 30.0);
    assert_eq!(stats.cleanliness, 100.0, "malformed stat restores full");
}

#[test]
fn care_raises_and_clamps() {
    let saved = json!({ "stats": { "hunger": 90.0, "energy": 10.0 } });
    let (mut session, _) = resume(&saved, t0());

    assert_eq!(session.care(CareAction::Feed).hunger, 100.0);
    assert_eq!(session.care(CareAction::Rest).energy, 35.0);
}

/// A clock that jumps backwards mid-session never costs the pet age.
#[test]
fn backward_clock_mid_session() {
    let mut session = fresh(t0());
    session.start(t0());
    session.pump(t0() + Duration::days(8));
    assert_eq!(session.growth().current_stage(), GrowthStage::Teen);

    let events = session.pump(t0() + Duration::days(2));
    assert_eq!(count(&events, "growth_checked"), 0);
    assert_eq!(session.growth().age_in_days(), 8);
    assert_eq!(session.growth().current_stage(), GrowthStage::Teen);
}

/// Child and teen arrivals never reach the sink; adult reaches it once.
#[test]
fn achievement_sink_hears_only_adult() {
    let sink = CountingSink::default();
    let mut session = fresh(t0());
    session.set_achievement_sink(Box::new(sink.clone()));
    session.start(t0());

    session.pump(t0() + Duration::days(4));
    assert_eq!(session.growth().current_stage(), GrowthStage::Child);
    assert!(sink.calls.borrow().is_empty(), "baby -> child is not reported");

    session.pump(t0() + Duration::days(8));
    assert_eq!(session.growth().current_stage(), GrowthStage::Teen);
    assert!(sink.calls.borrow().is_empty(), "child -> teen is not reported");

    session.pump(t0() + Duration::days(15));
    session.pump(t0() + Duration::days(30));
    assert_eq!(*sink.calls.borrow(), vec![GrowthStage::Adult]);
}

#[test]
fn achievement_sink_hears_adult_catch_up_once() {
    let sink = CountingSink::default();
    let now = t0() + Duration::days(40);
    let saved = json!({
        "growth": {
            "currentStage": "baby",
            "ageInDays": 0,
            "lastCheckTimestamp": (now - Duration::days(20)).timestamp_millis(),
        },
    });

    let (session, _) = PetSession::resume_with_sink(
        "session-test".into(),
        42,
        PetConfig::default_test(),
        &saved,
        now,
        Some(Box::new(sink.clone())),
    );
    assert_eq!(session.growth().current_stage(), GrowthStage::Adult);
    assert_eq!(*sink.calls.borrow(), vec![GrowthStage::Adult]);

    // A child-stage catch-up stays silent.
    let quiet = CountingSink::default();
    let saved = json!({
        "growth": {
            "currentStage": "baby",
            "ageInDays": 0,
            "lastCheckTimestamp": (now - Duration::days(5)).timestamp_millis(),
        },
    });
    let (session, events) = PetSession::resume_with_sink(
        "session-test".into(),
        42,
        PetConfig::default_test(),
        &saved,
        now,
        Some(Box::new(quiet.clone())),
    );
    assert_eq!(session.growth().current_stage(), GrowthStage::Child);
    assert_eq!(count(&events, "stage_evolved"), 1);
    assert!(quiet.calls.borrow().is_empty());
}

/// Oversized intervals are clamped instead of overflowing the calendar.
#[test]
fn oversized_intervals_do_not_panic() {
    let mut config = PetConfig::default_test();
    config.growth_interval_secs = 100_000_000_000_000;
    config.ambient_interval_secs = i64::MAX;
    assert!(config.validate().is_err());

    let mut session = PetSession::new("session-test".into(), 42, config, t0());
    session.start(t0());
    assert!(session.is_running());
    assert!(!session.pump(t0() + Duration::hours(1)).is_empty());
}
