//! Configuration for both controllers.
//!
//! Uses `heapless::String` for message text so the config stays usable
//! without `std`. With `std`, [`Config::from_env`] layers environment
//! overrides on top of the defaults.
//!
//! # Example
//!
//! ```rust
//! use rs_blinkz::config::{BeaconConfig, Config, ThermostatConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.beacon.primary_message.as_str(), "SOS");
//!
//! // Or customize
//! let config = Config::default()
//!     .with_beacon(BeaconConfig::default().with_messages("CQ", "DE K1ABC"))
//!     .with_thermostat(ThermostatConfig::default().with_initial_set_point(68));
//! assert_eq!(config.thermostat.initial_set_point, 68);
//! ```

use heapless::String as HString;

use crate::beacon::BeaconTiming;

/// Maximum length of a beacon message.
pub const MAX_MESSAGE_LEN: usize = 64;

/// Longest accepted beacon time unit, one minute.
pub const MAX_TIME_UNIT_MS: u32 = 60_000;

/// Message text.
pub type ShortString = HString<MAX_MESSAGE_LEN>;

/// Creates a [`ShortString`] from `s`, truncating on a character boundary.
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Morse beacon settings
    pub beacon: BeaconConfig,
    /// Thermostat settings
    pub thermostat: ThermostatConfig,
    /// Process shutdown settings
    pub shutdown: ShutdownConfig,
}

impl Config {
    /// Set beacon configuration
    pub fn with_beacon(mut self, beacon: BeaconConfig) -> Self {
        self.beacon = beacon;
        self
    }

    /// Set thermostat configuration
    pub fn with_thermostat(mut self, thermostat: ThermostatConfig) -> Self {
        self.thermostat = thermostat;
        self
    }

    /// Set shutdown configuration
    pub fn with_shutdown(mut self, shutdown: ShutdownConfig) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Defaults overridden by `BLINKZ_*` environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `BLINKZ_PRIMARY_MESSAGE` | `beacon.primary_message` |
    /// | `BLINKZ_ALTERNATE_MESSAGE` | `beacon.alternate_message` |
    /// | `BLINKZ_TIME_UNIT_MS` | `beacon.time_unit_ms` |
    /// | `BLINKZ_SET_POINT` | `thermostat.initial_set_point` |
    /// | `BLINKZ_TICK_MS` | `thermostat.tick_ms` |
    ///
    /// Values that fail to parse are ignored with a warning; out-of-range
    /// values are clamped as by the `with_*` builders.
    #[cfg(feature = "std")]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value if set.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<alloc::string::String>,
    {
        if let Some(message) = lookup("BLINKZ_PRIMARY_MESSAGE") {
            self.beacon.primary_message = short_string(&message);
        }
        if let Some(message) = lookup("BLINKZ_ALTERNATE_MESSAGE") {
            self.beacon.alternate_message = short_string(&message);
        }
        if let Some(unit) = parse_var(&lookup, "BLINKZ_TIME_UNIT_MS") {
            self.beacon = self.beacon.with_time_unit_ms(unit);
        }
        if let Some(set_point) = parse_var(&lookup, "BLINKZ_SET_POINT") {
            self.thermostat.initial_set_point = set_point;
        }
        if let Some(tick) = parse_var(&lookup, "BLINKZ_TICK_MS") {
            self.thermostat = self.thermostat.with_tick_ms(tick);
        }
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: core::str::FromStr,
    F: Fn(&str) -> Option<alloc::string::String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}

// ============================================================================
// Beacon Config
// ============================================================================

/// Morse beacon configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeaconConfig {
    /// Message sent at startup
    pub primary_message: ShortString,
    /// Message the toggle button switches to
    pub alternate_message: ShortString,
    /// One time unit in milliseconds; a dot is half a unit
    pub time_unit_ms: u32,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            primary_message: short_string("SOS"),
            alternate_message: short_string("OK"),
            time_unit_ms: 1000,
        }
    }
}

impl BeaconConfig {
    /// Set both messages
    pub fn with_messages(mut self, primary: &str, alternate: &str) -> Self {
        self.primary_message = short_string(primary);
        self.alternate_message = short_string(alternate);
        self
    }

    /// Set the time unit (1 ms to [`MAX_TIME_UNIT_MS`])
    pub fn with_time_unit_ms(mut self, ms: u32) -> Self {
        self.time_unit_ms = ms.clamp(1, MAX_TIME_UNIT_MS);
        self
    }

    /// Hold times derived from the time unit
    pub fn timing(&self) -> BeaconTiming {
        BeaconTiming::from_unit_ms(self.time_unit_ms)
    }
}

// ============================================================================
// Thermostat Config
// ============================================================================

/// Thermostat configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermostatConfig {
    /// Set point at startup, °F
    pub initial_set_point: i32,
    /// Change per increment/decrement press, °F
    pub set_point_step: i32,
    /// Status worker tick interval
    pub tick_ms: u32,
    /// Ticks each LCD second-line view stays up
    pub alternate_every: u32,
    /// Ticks between serial status records
    pub serial_every: u32,
    /// Fade time used when an indicator pulses
    pub pulse_fade_ms: u32,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            initial_set_point: 72,
            set_point_step: 1,
            tick_ms: 1000,
            alternate_every: 5,
            serial_every: 30,
            pulse_fade_ms: 1000,
        }
    }
}

impl ThermostatConfig {
    /// Set the startup set point
    pub fn with_initial_set_point(mut self, set_point: i32) -> Self {
        self.initial_set_point = set_point;
        self
    }

    /// Set the set point step (at least 1)
    pub fn with_set_point_step(mut self, step: i32) -> Self {
        self.set_point_step = step.max(1);
        self
    }

    /// Set the tick interval (at least 1 ms)
    pub fn with_tick_ms(mut self, ms: u32) -> Self {
        self.tick_ms = ms.max(1);
        self
    }

    /// Set the LCD alternation period in ticks (at least 1)
    pub fn with_alternate_every(mut self, ticks: u32) -> Self {
        self.alternate_every = ticks.max(1);
        self
    }

    /// Set the serial period in ticks (at least 1)
    pub fn with_serial_every(mut self, ticks: u32) -> Self {
        self.serial_every = ticks.max(1);
        self
    }

    /// Set the pulse fade time
    pub fn with_pulse_fade_ms(mut self, ms: u32) -> Self {
        self.pulse_fade_ms = ms;
        self
    }
}

// ============================================================================
// Shutdown Config
// ============================================================================

/// Orderly shutdown timing.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShutdownConfig {
    /// How long to wait for the worker after flagging termination
    pub grace_ms: u32,
    /// Poll interval while waiting for an interrupt or the worker
    pub poll_ms: u32,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_ms: 1000,
            poll_ms: 100,
        }
    }
}

impl ShutdownConfig {
    /// Set the grace period
    pub fn with_grace_ms(mut self, ms: u32) -> Self {
        self.grace_ms = ms;
        self
    }

    /// Set the poll interval (at least 1 ms)
    pub fn with_poll_ms(mut self, ms: u32) -> Self {
        self.poll_ms = ms.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.beacon.primary_message.as_str(), "SOS");
        assert_eq!(config.beacon.alternate_message.as_str(), "OK");
        assert_eq!(config.beacon.time_unit_ms, 1000);
        assert_eq!(config.thermostat.initial_set_point, 72);
        assert_eq!(config.thermostat.serial_every, 30);
        assert_eq!(config.shutdown.grace_ms, 1000);
    }

    #[test]
    fn short_string_truncation() {
        let long = "X".repeat(100);
        assert_eq!(short_string(&long).len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn short_string_utf8_boundary() {
        // 63 ASCII bytes then a 2-byte character that does not fit
        let mut s = "a".repeat(63);
        s.push('é');
        let hs = short_string(&s);
        assert_eq!(hs.len(), 63);
        assert!(core::str::from_utf8(hs.as_bytes()).is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_beacon(BeaconConfig::default().with_time_unit_ms(200))
            .with_shutdown(ShutdownConfig::default().with_grace_ms(50).with_poll_ms(0));
        assert_eq!(config.beacon.timing().dot_ms, 100);
        assert_eq!(config.shutdown.grace_ms, 50);
        assert_eq!(config.shutdown.poll_ms, 1);
    }

    // =========================================================================
    // Thermostat config
    // =========================================================================

    #[test]
    fn thermostat_config_clamps_periods() {
        let config = ThermostatConfig::default()
            .with_alternate_every(0)
            .with_serial_every(0)
            .with_set_point_step(-3);
        assert_eq!(config.alternate_every, 1);
        assert_eq!(config.serial_every, 1);
        assert_eq!(config.set_point_step, 1);
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn overrides_apply() {
        let config = Config::default().with_overrides(lookup(&[
            ("BLINKZ_PRIMARY_MESSAGE", "HELLO"),
            ("BLINKZ_TIME_UNIT_MS", " 250 "),
            ("BLINKZ_SET_POINT", "-5"),
            ("BLINKZ_TICK_MS", "10"),
        ]));
        assert_eq!(config.beacon.primary_message.as_str(), "HELLO");
        assert_eq!(config.beacon.alternate_message.as_str(), "OK");
        assert_eq!(config.beacon.time_unit_ms, 250);
        assert_eq!(config.thermostat.initial_set_point, -5);
        assert_eq!(config.thermostat.tick_ms, 10);
    }

    #[test]
    fn unparsable_override_is_ignored() {
        let config = Config::default().with_overrides(lookup(&[
            ("BLINKZ_TIME_UNIT_MS", "fast"),
            ("BLINKZ_SET_POINT", "72.5"),
        ]));
        assert_eq!(config.beacon.time_unit_ms, 1000);
        assert_eq!(config.thermostat.initial_set_point, 72);
    }

    #[test]
    fn zero_periods_clamped_to_one() {
        let config = Config::default().with_overrides(lookup(&[
            ("BLINKZ_TIME_UNIT_MS", "0"),
            ("BLINKZ_TICK_MS", "0"),
        ]));
        assert_eq!(config.beacon.time_unit_ms, 1);
        assert_eq!(config.thermostat.tick_ms, 1);
        assert_eq!(ThermostatConfig::default().with_tick_ms(0).tick_ms, 1);
    }

    #[test]
    fn oversized_time_unit_clamped() {
        let config = Config::default().with_overrides(lookup(&[(
            "BLINKZ_TIME_UNIT_MS",
            "2000000000",
        )]));
        assert_eq!(config.beacon.time_unit_ms, MAX_TIME_UNIT_MS);
        assert_eq!(config.beacon.timing().word_gap_ms, 3 * MAX_TIME_UNIT_MS);

        let beacon = BeaconConfig::default().with_time_unit_ms(u32::MAX);
        assert_eq!(beacon.time_unit_ms, MAX_TIME_UNIT_MS);
    }
}
