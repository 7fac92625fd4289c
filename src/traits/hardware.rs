//! Hardware capability traits consumed by the controllers.
//!
//! The controllers never touch GPIO, I2C or UART registers directly. Each
//! physical collaborator sits behind one of these traits so the state
//! machines run unchanged against real drivers, the desktop simulation
//! drivers in [`crate::hal::console`], or the test doubles in
//! [`crate::hal::mock`].
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`DigitalOutput`] | LED that can be on, off or pulsing |
//! | [`TemperatureSensor`] | Celsius reading from a shared bus |
//! | [`SerialPort`] | Line-oriented serial output |
//! | [`ButtonSource`] | Press callbacks from a push button |
//! | [`Delay`] | Blocking delay used to hold a signal |
//!
//! # Example
//!
//! ```rust
//! use rs_blinkz::traits::{DigitalOutput, LedLevel};
//! use rs_blinkz::hal::MockLed;
//!
//! let mut led = MockLed::new();
//! led.pulse(1000, 1000).unwrap();
//! assert_eq!(led.level(), LedLevel::Pulsing);
//!
//! led.off().unwrap();
//! assert_eq!(led.level(), LedLevel::Off);
//! ```

use alloc::boxed::Box;
use core::fmt::Debug;

/// Observable level of a [`DigitalOutput`].
///
/// # Default
///
/// Defaults to [`Off`](Self::Off).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LedLevel {
    /// Dark.
    #[default]
    Off,
    /// Lit steadily.
    On,
    /// Fading in and out continuously.
    Pulsing,
}

impl LedLevel {
    /// Returns the level as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LedLevel::Off => "off",
            LedLevel::On => "on",
            LedLevel::Pulsing => "pulsing",
        }
    }
}

/// A single LED (or any on/off output with a pulse mode).
///
/// # Implementation Notes
///
/// - `pulse` starts a continuous fade cycle that keeps running until the
///   next `on` or `off` call; it must not block.
/// - `on` and `off` are idempotent.
pub trait DigitalOutput {
    /// Error type for output operations.
    type Error: Debug;

    /// Drive the output fully on.
    fn on(&mut self) -> Result<(), Self::Error>;

    /// Drive the output off.
    fn off(&mut self) -> Result<(), Self::Error>;

    /// Start pulsing with the given fade times in milliseconds.
    fn pulse(&mut self, fade_in_ms: u32, fade_out_ms: u32) -> Result<(), Self::Error>;

    /// Apply an [`LedLevel`], using `fade_ms` for both fades when pulsing.
    fn set_level(&mut self, level: LedLevel, fade_ms: u32) -> Result<(), Self::Error> {
        match level {
            LedLevel::Off => self.off(),
            LedLevel::On => self.on(),
            LedLevel::Pulsing => self.pulse(fade_ms, fade_ms),
        }
    }
}

/// Temperature sensor on a bus that is not safe for concurrent access.
///
/// Callers must serialize reads; the threaded runtime keeps the sensor
/// behind a single global lock (see `services::thermostat::SensorBus`).
pub trait TemperatureSensor {
    /// Error type for sensor reads.
    type Error: Debug;

    /// Reads the current temperature in degrees Celsius.
    fn read_celsius(&mut self) -> Result<f32, Self::Error>;
}

/// Line-oriented serial output.
pub trait SerialPort {
    /// Error type for serial writes.
    type Error: Debug;

    /// Writes `text` followed by a single `\n`.
    fn write_line(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// Zero-argument press callback.
pub type PressCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Push-button input.
///
/// Callbacks run asynchronously on whatever thread the input dispatcher
/// uses; they must be safe to run concurrently with the worker thread.
pub trait ButtonSource {
    /// Registers `callback` to run on every press.
    ///
    /// Registering again replaces the previous callback.
    fn when_pressed(&mut self, callback: PressCallback);
}

/// Blocking delay.
///
/// Used by state entry actions to keep an output asserted for a fixed
/// wall-clock duration. Nothing else runs on the calling thread meanwhile.
pub trait Delay {
    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}
