//! Ambient time-of-day and weather.
//!
//! Nothing here accumulates: hour and weather are recomputed from `now`
//! plus one weather roll on every tick. The only persisted field is the
//! last-update marker.
//!
//! Weather sampling is SEQUENTIAL: rain is rolled first, cloud is rolled
//! only if rain failed. With the default 0.2 / 0.3 that is 20% rainy,
//! 24% cloudy, 56% sunny. Do not collapse it into one weighted draw.

use crate::{
    config::WeatherConfig,
    rng::SubsystemRng,
    scheduler::{RecurringTrigger, Scheduler, TaskId},
    snapshot::lenient_i64,
    types::{from_millis, to_millis, EpochMillis},
};
use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Night,
}

impl WeatherCondition {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Sunny  => "☀️",
            Self::Cloudy => "☁️",
            Self::Rainy  => "🌧️",
            Self::Night  => "🌙",
        }
    }
}

/// Night covers [20, 24) and [0, 6).
pub fn is_night_hour(hour: u32) -> bool {
    hour >= 20 || hour < 6
}

pub fn is_day_hour(hour: u32) -> bool {
    !is_night_hour(hour)
}

fn is_dawn_hour(hour: u32) -> bool {
    (6..8).contains(&hour)
}

fn is_dusk_hour(hour: u32) -> bool {
    (18..20).contains(&hour)
}

/// Night wins over any roll. Otherwise rain, then cloud, then sun.
pub fn sample_weather(hour: u32, config: &WeatherConfig, rng: &mut SubsystemRng) -> WeatherCondition {
    if is_night_hour(hour) {
        return WeatherCondition::Night;
    }
    if rng.chance(config.rain_chance) {
        WeatherCondition::Rainy
    } else if rng.chance(config.cloud_chance) {
        WeatherCondition::Cloudy
    } else {
        WeatherCondition::Sunny
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

pub const SKY_NIGHT:   Rgb = Rgb(0x1a, 0x1a, 0x3e);
pub const SKY_DAWN:    Rgb = Rgb(0xff, 0xb8, 0x8c);
pub const SKY_DUSK:    Rgb = Rgb(0xff, 0x7e, 0x5f);
pub const SKY_RAINY:   Rgb = Rgb(0x70, 0x80, 0x90);
pub const SKY_CLOUDY:  Rgb = Rgb(0xb0, 0xc4, 0xde);
pub const SKY_DEFAULT: Rgb = Rgb(0x87, 0xce, 0xeb);

/// Full-screen tint drawn over the scene. alpha 0.0 = invisible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LightingOverlay {
    pub tint:  (f32, f32, f32),
    pub alpha: f32,
}

pub const OVERLAY_NIGHT:  LightingOverlay = LightingOverlay { tint: (0.1, 0.1, 0.3), alpha: 0.5 };
pub const OVERLAY_DAWN:   LightingOverlay = LightingOverlay { tint: (1.0, 0.7, 0.4), alpha: 0.15 };
pub const OVERLAY_DUSK:   LightingOverlay = LightingOverlay { tint: (1.0, 0.5, 0.3), alpha: 0.2 };
pub const OVERLAY_RAINY:  LightingOverlay = LightingOverlay { tint: (0.3, 0.3, 0.4), alpha: 0.25 };
pub const OVERLAY_CLOUDY: LightingOverlay = LightingOverlay { tint: (0.5, 0.5, 0.5), alpha: 0.1 };
pub const OVERLAY_CLEAR:  LightingOverlay = LightingOverlay { tint: (1.0, 1.0, 1.0), alpha: 0.0 };

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AmbientState {
    pub current_hour:    u32,
    pub current_weather: WeatherCondition,
}

impl Default for AmbientState {
    fn default() -> Self {
        Self {
            current_hour:    12,
            current_weather: WeatherCondition::Sunny,
        }
    }
}

impl AmbientState {
    pub fn is_night(&self) -> bool {
        is_night_hour(self.current_hour)
    }

    pub fn is_day(&self) -> bool {
        is_day_hour(self.current_hour)
    }

    // Precedence for colour and lighting:
    //   night > dawn > dusk > weather > default daytime.

    pub fn sky_color(&self) -> Rgb {
        let h = self.current_hour;
        if is_night_hour(h) {
            SKY_NIGHT
        } else if is_dawn_hour(h) {
            SKY_DAWN
        } else if is_dusk_hour(h) {
            SKY_DUSK
        } else {
            match self.current_weather {
                WeatherCondition::Rainy  => SKY_RAINY,
                WeatherCondition::Cloudy => SKY_CLOUDY,
                _                        => SKY_DEFAULT,
            }
        }
    }

    pub fn lighting_overlay(&self) -> LightingOverlay {
        let h = self.current_hour;
        if is_night_hour(h) {
            OVERLAY_NIGHT
        } else if is_dawn_hour(h) {
            OVERLAY_DAWN
        } else if is_dusk_hour(h) {
            OVERLAY_DUSK
        } else {
            match self.current_weather {
                WeatherCondition::Rainy  => OVERLAY_RAINY,
                WeatherCondition::Cloudy => OVERLAY_CLOUDY,
                _                        => OVERLAY_CLEAR,
            }
        }
    }

    pub fn time_greeting(&self) -> &'static str {
        match self.current_hour {
            h if is_night_hour(h) => "Good night",
            6..=11                => "Good morning",
            12..=17               => "Good afternoon",
            _                     => "Good evening",
        }
    }

    pub fn weather_icon(&self) -> &'static str {
        self.current_weather.icon()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AmbientSnapshot {
    pub last_update: Option<EpochMillis>,
}

impl AmbientSnapshot {
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self {
            last_update: lenient_i64(value.get("lastUpdate")),
        }
    }
}

#[derive(Debug)]
pub struct AmbientTimeEngine {
    state:       AmbientState,
    utc_offset:  FixedOffset,
    weather:     WeatherConfig,
    rng:         SubsystemRng,
    last_update: Option<DateTime<Utc>>,
    interval:    Duration,
    trigger:     RecurringTrigger,
}

impl AmbientTimeEngine {
    pub fn new(
        utc_offset: FixedOffset,
        weather: WeatherConfig,
        rng: SubsystemRng,
        interval: Duration,
    ) -> Self {
        Self {
            state: AmbientState::default(),
            utc_offset,
            weather,
            rng,
            last_update: None,
            interval,
            trigger: RecurringTrigger::new(),
        }
    }

    pub fn state(&self) -> AmbientState {
        self.state
    }

    pub fn current_hour(&self) -> u32 {
        self.state.current_hour
    }

    pub fn current_weather(&self) -> WeatherCondition {
        self.state.current_weather
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Local hour-of-day for `now`, using this engine's UTC offset.
    pub fn hour_of_day(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.utc_offset).hour()
    }

    /// Recompute hour and weather from scratch.
    pub fn tick(&mut self, now: DateTime<Utc>) -> AmbientState {
        let hour = self.hour_of_day(now);
        let weather = sample_weather(hour, &self.weather, &mut self.rng);
        self.state = AmbientState {
            current_hour:    hour,
            current_weather: weather,
        };
        self.last_update = Some(now);
        log::debug!("ambient: hour={hour} weather={weather:?}");
        self.state
    }

    /// No catch-up arithmetic here: loading just seeds the new session
    /// with one fresh tick.
    pub fn load_snapshot(&mut self, snapshot: &AmbientSnapshot, now: DateTime<Utc>) -> AmbientState {
        match snapshot.last_update.and_then(from_millis) {
            Some(prev) => log::debug!("ambient: last updated {prev}, refreshing"),
            None => log::debug!("ambient: never updated, refreshing"),
        }
        self.tick(now)
    }

    pub fn snapshot(&self) -> AmbientSnapshot {
        AmbientSnapshot {
            last_update: self.last_update.map(to_millis),
        }
    }

    pub fn is_night(&self) -> bool {
        self.state.is_night()
    }

    pub fn is_day(&self) -> bool {
        self.state.is_day()
    }

    pub fn sky_color(&self) -> Rgb {
        self.state.sky_color()
    }

    pub fn lighting_overlay(&self) -> LightingOverlay {
        self.state.lighting_overlay()
    }

    pub fn time_greeting(&self) -> &'static str {
        self.state.time_greeting()
    }

    pub fn weather_icon(&self) -> &'static str {
        self.state.weather_icon()
    }

    /// Start the recurring refresh. Restarting cancels the previous
    /// registration so weather is never double-sampled.
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
