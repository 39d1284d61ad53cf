//! Ambient time/weather engine tests.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use pet_core::{
    ambient::{
        is_night_hour, sample_weather, AmbientSnapshot, AmbientState, AmbientTimeEngine,
        WeatherCondition, OVERLAY_CLEAR, OVERLAY_DAWN, OVERLAY_DUSK, OVERLAY_NIGHT,
        OVERLAY_RAINY, SKY_CLOUDY, SKY_DAWN, SKY_DEFAULT, SKY_DUSK, SKY_NIGHT, SKY_RAINY,
    },
    config::WeatherConfig,
    rng::{RngBank, SubsystemRng, SubsystemSlot},
    scheduler::Scheduler,
};

fn at_hour(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, 15, 0).unwrap()
}

fn engine(seed: u64) -> AmbientTimeEngine {
    engine_with_offset(seed, FixedOffset::east_opt(0).unwrap())
}

fn engine_with_offset(seed: u64, offset: FixedOffset) -> AmbientTimeEngine {
    AmbientTimeEngine::new(
        offset,
        WeatherConfig::default(),
        RngBank::new(seed).for_subsystem(SubsystemSlot::Ambient),
        Duration::seconds(60),
    )
}

fn state(hour: u32, weather: WeatherCondition) -> AmbientState {
    AmbientState { current_hour: hour, current_weather: weather }
}

/// Night overrides every roll, for every seed.
#[test]
fn night_hours_always_night_weather() {
    for seed in 0..200u64 {
        let mut engine = engine(seed);
        let s = engine.tick(at_hour(21));
        assert_eq!(s.current_hour, 21);
        assert_eq!(s.current_weather, WeatherCondition::Night, "seed {seed}");
        assert_eq!(engine.weather_icon(), "🌙");
        assert!(engine.is_night());
    }
}

#[test]
fn night_range_is_twenty_to_six() {
    let night: Vec<u32> = (0..24).filter(|h| is_night_hour(*h)).collect();
    assert_eq!(night, vec![0, 1, 2, 3, 4, 5, 20, 21, 22, 23]);

    let mut engine = engine(7);
    for hour in 6..20 {
        for _ in 0..20 {
            let s = engine.tick(at_hour(hour));
            assert_ne!(s.current_weather, WeatherCondition::Night, "hour {hour}");
            assert!(engine.is_day());
        }
    }
}

/// Sequential thresholds: 20% rainy, 80% * 30% = 24% cloudy, 56% sunny.
#[test]
fn daytime_weather_distribution_is_sequential() {
    let config = WeatherConfig::default();
    let mut rng = SubsystemRng::new(0xC0FF_EE00, 1);
    let draws = 100_000;
    let (mut rainy, mut cloudy, mut sunny) = (0, 0, 0);
    for _ in 0..draws {
        match sample_weather(12, &config, &mut rng) {
            WeatherCondition::Rainy  => rainy += 1,
            WeatherCondition::Cloudy => cloudy += 1,
            WeatherCondition::Sunny  => sunny += 1,
            WeatherCondition::Night  => panic!("night at noon"),
        }
    }
    let share = |n: i32| n as f64 / draws as f64;
    assert!((share(rainy) - 0.20).abs() < 0.01, "rainy share {}", share(rainy));
    assert!((share(cloudy) - 0.24).abs() < 0.01, "cloudy share {}", share(cloudy));
    assert!((share(sunny) - 0.56).abs() < 0.01, "sunny share {}", share(sunny));
}

#[test]
fn weather_probabilities_are_configurable() {
    let always_rain = WeatherConfig { rain_chance: 1.0, cloud_chance: 0.0 };
    let never = WeatherConfig { rain_chance: 0.0, cloud_chance: 0.0 };
    let mut rng = SubsystemRng::new(1, 1);
    for _ in 0..50 {
        assert_eq!(sample_weather(10, &always_rain, &mut rng), WeatherCondition::Rainy);
        assert_eq!(sample_weather(10, &never, &mut rng), WeatherCondition::Sunny);
    }
}

/// night > dawn > dusk > weather > default.
#[test]
fn sky_color_precedence() {
    assert_eq!(state(7, WeatherCondition::Rainy).sky_color(), SKY_DAWN);
    assert_eq!(state(6, WeatherCondition::Sunny).sky_color(), SKY_DAWN);
    assert_eq!(state(19, WeatherCondition::Cloudy).sky_color(), SKY_DUSK);
    assert_eq!(state(18, WeatherCondition::Sunny).sky_color(), SKY_DUSK);
    assert_eq!(state(12, WeatherCondition::Rainy).sky_color(), SKY_RAINY);
    assert_eq!(state(12, WeatherCondition::Cloudy).sky_color(), SKY_CLOUDY);
    assert_eq!(state(12, WeatherCondition::Sunny).sky_color(), SKY_DEFAULT);
    assert_eq!(state(5, WeatherCondition::Sunny).sky_color(), SKY_NIGHT);
    assert_eq!(state(20, WeatherCondition::Night).sky_color(), SKY_NIGHT);
}

#[test]
fn lighting_overlay_precedence() {
    assert_eq!(state(23, WeatherCondition::Night).lighting_overlay(), OVERLAY_NIGHT);
    assert_eq!(state(7, WeatherCondition::Rainy).lighting_overlay(), OVERLAY_DAWN);
    assert_eq!(state(19, WeatherCondition::Rainy).lighting_overlay(), OVERLAY_DUSK);
    assert_eq!(state(12, WeatherCondition::Rainy).lighting_overlay(), OVERLAY_RAINY);
    assert_eq!(state(12, WeatherCondition::Sunny).lighting_overlay(), OVERLAY_CLEAR);
    assert_eq!(OVERLAY_CLEAR.alpha, 0.0);
}

#[test]
fn greetings_and_icons() {
    assert_eq!(state(8, WeatherCondition::Sunny).time_greeting(), "Good morning");
    assert_eq!(state(13, WeatherCondition::Sunny).time_greeting(), "Good afternoon");
    assert_eq!(state(18, WeatherCondition::Sunny).time_greeting(), "Good evening");
    assert_eq!(state(22, WeatherCondition::Night).time_greeting(), "Good night");
    assert_eq!(state(3, WeatherCondition::Night).time_greeting(), "Good night");

    assert_eq!(state(12, WeatherCondition::Rainy).weather_icon(), "🌧️");
    assert_eq!(state(12, WeatherCondition::Sunny).weather_icon(), "☀️");
    assert_eq!(SKY_DEFAULT.hex(), "#87ceeb");
}

/// Hour-of-day is local: 12:15 UTC is 21:15 in UTC+9.
#[test]
fn hour_uses_configured_offset() {
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let mut engine = engine_with_offset(3, tokyo);
    let s = engine.tick(at_hour(12));
    assert_eq!(s.current_hour, 21);
    assert_eq!(s.current_weather, WeatherCondition::Night);
}

#[test]
fn load_snapshot_seeds_fresh_state() {
    let mut engine = engine(11);
    assert_eq!(engine.last_update(), None);
    assert_eq!(engine.snapshot(), AmbientSnapshot { last_update: None });

    let now = at_hour(22);
    let s = engine.load_snapshot(&AmbientSnapshot::default(), now);
    assert_eq!(s.current_hour, 22);
    assert_eq!(engine.last_update(), Some(now));
    assert_eq!(engine.snapshot().last_update, Some(now.timestamp_millis()));

    let old = AmbientSnapshot { last_update: Some((now - Duration::days(3)).timestamp_millis()) };
    let later = at_hour(23);
    engine.load_snapshot(&old, later);
    assert_eq!(engine.last_update(), Some(later));
}

#[test]
fn snapshot_from_garbage_is_empty() {
    let snap = AmbientSnapshot::from_value(&serde_json::json!({ "lastUpdate": "yesterday" }));
    assert_eq!(snap.last_update, None);
}

/// Restarting never stacks a second timer.
#[test]
fn start_twice_keeps_one_registration() {
    let mut scheduler = Scheduler::new();
    let mut engine = engine(5);
    let now = at_hour(10);

    engine.stop(&mut scheduler); // never started: fine
    engine.start(&mut scheduler, now);
    engine.start(&mut scheduler, now);
    engine.start(&mut scheduler, now + Duration::seconds(5));
    assert_eq!(scheduler.len(), 1);
    assert!(engine.is_running());

    let fired = scheduler.poll(now + Duration::seconds(65));
    assert_eq!(fired.len(), 1);
    assert!(engine.fired(&fired));

    engine.stop(&mut scheduler);
    engine.stop(&mut scheduler);
    assert!(scheduler.is_empty());
    assert!(!engine.is_running());
    assert!(scheduler.poll(now + Duration::minutes(10)).is_empty());
}
