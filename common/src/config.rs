use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Control-law and setpoint parameters. Temperatures are tenths of a degree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatConfig {
    pub default_setpoint: i32,
    pub setpoint_step: i32,
    pub setpoint_min: i32,
    pub setpoint_max: i32,
    pub threshold_band: i32,
    pub seed_offset: i32,
    pub plausible_min: i32,
    pub plausible_max: i32,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            default_setpoint: 700,
            setpoint_step: 10,
            setpoint_min: 500,
            setpoint_max: 900,
            threshold_band: 15,
            seed_offset: 20,
            plausible_min: 300,
            plausible_max: 1100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub sensor_power_on_settle_ms: u64,
    pub conversion_latency_ms: u64,
    pub sensor_period_ms: u64,
    pub control_period_ms: u64,
    pub input_poll_ms: u64,
    pub startup_delay_ms: u64,
    pub screen_timeout_ms: u64,
    pub heartbeat_on_ms: u64,
    pub heartbeat_pause_ms: u64,
    pub heartbeat_blinks: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sensor_power_on_settle_ms: 20,
            conversion_latency_ms: 80,
            sensor_period_ms: 3_000,
            control_period_ms: 1_000,
            input_poll_ms: 5,
            startup_delay_ms: 5_000,
            screen_timeout_ms: 3_000,
            heartbeat_on_ms: 500,
            heartbeat_pause_ms: 1_500,
            heartbeat_blinks: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DebounceMode {
    /// A single sample at the new level is an edge.
    LevelSampled,
    /// The new level must be seen on `samples` consecutive polls.
    Settled { samples: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub debounce: DebounceMode,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce: DebounceMode::LevelSampled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub brightness: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { brightness: 0x0F }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub thermostat: ThermostatConfig,
    pub timing: TimingConfig,
    pub input: InputConfig,
    pub display: DisplayConfig,
}

impl RuntimeConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json(raw: &[u8]) -> Result<Self, ConfigError> {
        let mut config: RuntimeConfig = serde_json::from_slice(raw)?;
        config.sanitize();
        config.validate()?;
        Ok(config)
    }

    pub fn sanitize(&mut self) {
        self.thermostat.sanitize();
        self.input.sanitize();
        self.display.brightness = self.display.brightness.min(0x0F);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let timing = &self.timing;
        if timing.conversion_latency_ms < 80 {
            return Err(ConfigError::Invalid(
                "conversion latency must be at least 80 ms",
            ));
        }
        if timing.conversion_latency_ms >= timing.sensor_period_ms {
            return Err(ConfigError::Invalid(
                "conversion latency must be shorter than the sensor period",
            ));
        }
        if timing.input_poll_ms == 0 || timing.control_period_ms == 0 {
            return Err(ConfigError::Invalid("poll periods must be non-zero"));
        }
        if timing.screen_timeout_ms == 0 {
            return Err(ConfigError::Invalid("screen timeout must be non-zero"));
        }
        if self.thermostat.plausible_min >= self.thermostat.plausible_max {
            return Err(ConfigError::Invalid("plausibility band is empty"));
        }
        Ok(())
    }
}

impl ThermostatConfig {
    pub fn sanitize(&mut self) {
        if self.setpoint_min > self.setpoint_max {
            std::mem::swap(&mut self.setpoint_min, &mut self.setpoint_max);
        }
        self.setpoint_min = self.setpoint_min.clamp(30, 999);
        self.setpoint_max = self.setpoint_max.clamp(self.setpoint_min, 999);
        self.default_setpoint = self
            .default_setpoint
            .clamp(self.setpoint_min, self.setpoint_max);
        self.setpoint_step = self.setpoint_step.clamp(1, 100);
        self.threshold_band = self.threshold_band.clamp(1, 100);
        self.seed_offset = self.seed_offset.clamp(1, 100);
    }

    /// Value the averaging filter and published temperature start from.
    pub fn seed_temperature(&self) -> i32 {
        self.default_setpoint.saturating_add(self.seed_offset)
    }
}

impl InputConfig {
    pub fn sanitize(&mut self) {
        if let DebounceMode::Settled { samples } = &mut self.debounce {
            *samples = (*samples).max(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = RuntimeConfig::from_json(b"{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let raw = br#"{
            "timing": { "screen_timeout_ms": 4500 },
            "input": { "debounce": { "kind": "settled", "samples": 3 } }
        }"#;
        let config = RuntimeConfig::from_json(raw).unwrap();

        assert_eq!(config.timing.screen_timeout_ms, 4_500);
        assert_eq!(config.timing.sensor_period_ms, 3_000);
        assert_eq!(config.input.debounce, DebounceMode::Settled { samples: 3 });
        assert_eq!(config.thermostat, ThermostatConfig::default());
    }

    #[test]
    fn conversion_latency_below_sensor_minimum_is_rejected() {
        let raw = br#"{ "timing": { "conversion_latency_ms": 40 } }"#;
        assert!(matches!(
            RuntimeConfig::from_json(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            RuntimeConfig::from_json(b"{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn sanitize_clamps_setpoint_and_brightness() {
        let mut config = RuntimeConfig::default();
        config.thermostat.default_setpoint = 2_000;
        config.thermostat.seed_offset = -5;
        config.display.brightness = 0x3F;
        config.input.debounce = DebounceMode::Settled { samples: 0 };

        config.sanitize();

        assert_eq!(config.thermostat.default_setpoint, 900);
        assert_eq!(config.thermostat.seed_offset, 1);
        assert_eq!(config.display.brightness, 0x0F);
        assert_eq!(config.input.debounce, DebounceMode::Settled { samples: 1 });
    }

    #[test]
    fn oversized_seed_offset_is_bounded() {
        let raw = br#"{ "thermostat": { "seed_offset": 2147483647 } }"#;
        let config = RuntimeConfig::from_json(raw).unwrap();

        assert_eq!(config.thermostat.seed_offset, 100);
        assert_eq!(config.thermostat.seed_temperature(), 800);
    }

    #[test]
    fn seed_sits_above_setpoint() {
        let config = ThermostatConfig::default();
        assert_eq!(config.seed_temperature(), 720);
    }
}
