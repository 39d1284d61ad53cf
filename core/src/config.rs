use chrono::{Duration, FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};

/// Longest allowed cadence for any engine trigger (one day).
pub const MAX_INTERVAL_SECS: i64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeatherConfig {
    /// Probability of rain on a daytime roll.
    pub rain_chance: f64,
    /// Probability of cloud, rolled only when rain did not hit.
    pub cloud_chance: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            rain_chance:  0.2,
            cloud_chance: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatDecayConfig {
    pub hunger_per_tick:      f64,
    pub energy_per_tick:      f64,
    pub happiness_per_tick:   f64,
    pub cleanliness_per_tick: f64,
    /// Amount a single care action restores.
    pub care_amount:          f64,
    pub floor:                f64,
    pub ceiling:              f64,
}

impl Default for StatDecayConfig {
    fn default() -> Self {
        Self {
            hunger_per_tick:      0.5,
            energy_per_tick:      0.3,
            happiness_per_tick:   0.4,
            cleanliness_per_tick: 0.2,
            care_amount:          25.0,
            floor:                0.0,
            ceiling:              100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PetConfig {
    pub ambient_interval_secs:    i64,
    pub growth_interval_secs:     i64,
    pub stat_decay_interval_secs: i64,
    /// None = take the host's local offset at start-up.
    pub utc_offset_minutes:       Option<i32>,
    pub weather:                  WeatherConfig,
    pub stats:                    StatDecayConfig,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            ambient_interval_secs:    60,
            growth_interval_secs:     60,
            stat_decay_interval_secs: 60,
            utc_offset_minutes:       None,
            weather:                  WeatherConfig::default(),
            stats:                    StatDecayConfig::default(),
        }
    }
}

impl PetConfig {
    /// Load from the data/ directory. A missing file means defaults.
    /// In tests, use PetConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/pet_config.json");
        let config = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("config: {path} not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("Cannot read {path}: {e}")),
        };
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests (UTC, no local offset).
    pub fn default_test() -> Self {
        Self {
            utc_offset_minutes: Some(0),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, p) in [
            ("weather.rain_chance", self.weather.rain_chance),
            ("weather.cloud_chance", self.weather.cloud_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                anyhow::bail!("{name} must be within [0, 1], got {p}");
            }
        }
        for (name, secs) in [
            ("ambient_interval_secs", self.ambient_interval_secs),
            ("growth_interval_secs", self.growth_interval_secs),
            ("stat_decay_interval_secs", self.stat_decay_interval_secs),
        ] {
            if secs <= 0 {
                anyhow::bail!("{name} must be positive, got {secs}");
            }
            if secs > MAX_INTERVAL_SECS {
                anyhow::bail!("{name} must be at most {MAX_INTERVAL_SECS}, got {secs}");
            }
        }
        if self.stats.floor >= self.stats.ceiling {
            anyhow::bail!(
                "stats.floor ({}) must be below stats.ceiling ({})",
                self.stats.floor,
                self.stats.ceiling
            );
        }
        if let Some(minutes) = self.utc_offset_minutes {
            if minutes.checked_mul(60).and_then(FixedOffset::east_opt).is_none() {
                anyhow::bail!("utc_offset_minutes out of range: {minutes}");
            }
        }
        Ok(())
    }

    pub fn ambient_interval(&self) -> Duration {
        clamped_interval("ambient_interval_secs", self.ambient_interval_secs)
    }

    pub fn growth_interval(&self) -> Duration {
        clamped_interval("growth_interval_secs", self.growth_interval_secs)
    }

    pub fn stat_decay_interval(&self) -> Duration {
        clamped_interval("stat_decay_interval_secs", self.stat_decay_interval_secs)
    }

    /// Resolve the configured offset, falling back to the host's local one.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|m| m.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Local::now().offset().fix())
    }
}

/// Unvalidated configs still get a usable cadence in [1s, MAX_INTERVAL_SECS].
fn clamped_interval(name: &str, secs: i64) -> Duration {
    let clamped = secs.clamp(1, MAX_INTERVAL_SECS);
    if clamped != secs {
        log::warn!("config: {name}={secs} out of range, using {clamped}");
    }
    Duration::try_seconds(clamped).unwrap_or_else(|| Duration::seconds(MAX_INTERVAL_SECS))
}
