//! Mock implementations for testing without hardware.
//!
//! Every mock keeps its state behind an `Arc<Mutex<_>>`, so a clone is a
//! view onto the same device: hand one clone to the controller (or move it
//! into a worker thread) and inspect the other from the test.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockLed`] | [`DigitalOutput`] | Current level plus full level history |
//! | [`MockDisplay`] | [`CharacterDisplay`] | Rendered frames, clears and releases |
//! | [`MockSensor`] | [`TemperatureSensor`] | Settable reading, can fail |
//! | [`MockSerial`] | [`SerialPort`] | Captured lines |
//! | [`MockButton`] | [`ButtonSource`] | `press()` runs the registered callback |
//! | [`MockDelay`] | [`Delay`] | Records requested delays without sleeping |
//!
//! # Example
//!
//! ```rust
//! use rs_blinkz::hal::MockLed;
//! use rs_blinkz::traits::{DigitalOutput, LedLevel};
//!
//! let led = MockLed::new();
//! let mut driver_side = led.clone();
//!
//! driver_side.on().unwrap();
//! driver_side.pulse(500, 500).unwrap();
//!
//! assert_eq!(led.level(), LedLevel::Pulsing);
//! assert_eq!(led.history(), vec![LedLevel::On, LedLevel::Pulsing]);
//! ```
//!
//! [`DigitalOutput`]: crate::traits::DigitalOutput
//! [`CharacterDisplay`]: crate::traits::CharacterDisplay
//! [`TemperatureSensor`]: crate::traits::TemperatureSensor
//! [`SerialPort`]: crate::traits::SerialPort
//! [`ButtonSource`]: crate::traits::ButtonSource
//! [`Delay`]: crate::traits::Delay

use std::string::{String, ToString};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use crate::traits::{
    ButtonSource, CharacterDisplay, Delay, DigitalOutput, LedLevel, PressCallback, SerialPort,
    TemperatureSensor,
};

/// Error returned by mocks switched into failure mode.
pub type MockError = &'static str;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// LED
// ============================================================================

#[derive(Debug, Default)]
struct LedInner {
    level: LedLevel,
    history: Vec<LedLevel>,
    last_fade_ms: Option<(u32, u32)>,
    failing: bool,
}

/// Mock LED.
///
/// Records every level change. In failure mode every call returns an error
/// and leaves the level untouched.
#[derive(Clone, Debug, Default)]
pub struct MockLed {
    inner: Arc<Mutex<LedInner>>,
}

impl MockLed {
    /// Creates a dark LED.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the LED into failure mode.
    pub fn failing(self) -> Self {
        self.set_failing(true);
        self
    }

    /// Turns failure mode on or off.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.inner).failing = failing;
    }

    /// Current level.
    pub fn level(&self) -> LedLevel {
        lock(&self.inner).level
    }

    /// Every level applied so far, oldest first.
    pub fn history(&self) -> Vec<LedLevel> {
        lock(&self.inner).history.clone()
    }

    /// Fade times of the most recent `pulse` call.
    pub fn last_fade_ms(&self) -> Option<(u32, u32)> {
        lock(&self.inner).last_fade_ms
    }

    fn apply(&self, level: LedLevel) -> Result<(), MockError> {
        let mut inner = lock(&self.inner);
        if inner.failing {
            return Err("LED failure");
        }
        inner.level = level;
        inner.history.push(level);
        Ok(())
    }
}

impl DigitalOutput for MockLed {
    type Error = MockError;

    fn on(&mut self) -> Result<(), MockError> {
        self.apply(LedLevel::On)
    }

    fn off(&mut self) -> Result<(), MockError> {
        self.apply(LedLevel::Off)
    }

    fn pulse(&mut self, fade_in_ms: u32, fade_out_ms: u32) -> Result<(), MockError> {
        self.apply(LedLevel::Pulsing)?;
        lock(&self.inner).last_fade_ms = Some((fade_in_ms, fade_out_ms));
        Ok(())
    }
}

// ============================================================================
// Display
// ============================================================================

#[derive(Debug, Default)]
struct DisplayInner {
    frames: Vec<[String; 2]>,
    clears: usize,
    releases: usize,
    fail_update: bool,
    fail_release: bool,
}

/// Mock two-line display.
///
/// # Example
///
/// ```rust
/// use rs_blinkz::hal::MockDisplay;
/// use rs_blinkz::traits::DisplayLease;
///
/// let display = MockDisplay::new();
/// let inspector = display.clone();
///
/// let mut lease = DisplayLease::new(display);
/// lease.show("Sending:", "SOS").unwrap();
/// drop(lease);
///
/// assert_eq!(inspector.last_frame().unwrap(), ["Sending:", "SOS"]);
/// assert_eq!(inspector.release_count(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockDisplay {
    inner: Arc<Mutex<DisplayInner>>,
}

impl MockDisplay {
    /// Creates a blank display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `update` fail.
    pub fn failing_update(self) -> Self {
        lock(&self.inner).fail_update = true;
        self
    }

    /// Makes every `release` fail.
    pub fn failing_release(self) -> Self {
        lock(&self.inner).fail_release = true;
        self
    }

    /// All frames written, oldest first.
    pub fn frames(&self) -> Vec<[String; 2]> {
        lock(&self.inner).frames.clone()
    }

    /// The most recent frame.
    pub fn last_frame(&self) -> Option<[String; 2]> {
        lock(&self.inner).frames.last().cloned()
    }

    /// Number of `clear` calls.
    pub fn clear_count(&self) -> usize {
        lock(&self.inner).clears
    }

    /// Number of `release` calls, including failed ones.
    pub fn release_count(&self) -> usize {
        lock(&self.inner).releases
    }
}

impl CharacterDisplay for MockDisplay {
    type Error = MockError;

    fn update(&mut self, lines: [&str; 2]) -> Result<(), MockError> {
        let mut inner = lock(&self.inner);
        if inner.fail_update {
            return Err("display update failure");
        }
        inner
            .frames
            .push([lines[0].to_string(), lines[1].to_string()]);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), MockError> {
        lock(&self.inner).clears += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), MockError> {
        let mut inner = lock(&self.inner);
        inner.releases += 1;
        if inner.fail_release {
            return Err("display release failure");
        }
        Ok(())
    }
}

// ============================================================================
// Sensor
// ============================================================================

#[derive(Debug, Default)]
struct SensorInner {
    celsius: f32,
    failing: bool,
    reads: usize,
}

/// Mock temperature sensor with a settable reading.
#[derive(Clone, Debug, Default)]
pub struct MockSensor {
    inner: Arc<Mutex<SensorInner>>,
}

impl MockSensor {
    /// Creates a sensor reporting `celsius`.
    pub fn new(celsius: f32) -> Self {
        let sensor = Self::default();
        sensor.set_celsius(celsius);
        sensor
    }

    /// Changes the reported temperature.
    pub fn set_celsius(&self, celsius: f32) {
        lock(&self.inner).celsius = celsius;
    }

    /// Makes reads fail until turned off again.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.inner).failing = failing;
    }

    /// Number of read attempts, including failed ones.
    pub fn read_count(&self) -> usize {
        lock(&self.inner).reads
    }
}

impl TemperatureSensor for MockSensor {
    type Error = MockError;

    fn read_celsius(&mut self) -> Result<f32, MockError> {
        let mut inner = lock(&self.inner);
        inner.reads += 1;
        if inner.failing {
            return Err("sensor bus error");
        }
        Ok(inner.celsius)
    }
}

// ============================================================================
// Serial
// ============================================================================

/// Mock serial port capturing each written line.
#[derive(Clone, Debug, Default)]
pub struct MockSerial {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MockSerial {
    /// Creates an empty port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far, without the trailing newline.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }
}

impl SerialPort for MockSerial {
    type Error = MockError;

    fn write_line(&mut self, text: &str) -> Result<(), MockError> {
        lock(&self.lines).push(text.to_string());
        Ok(())
    }
}

// ============================================================================
// Button
// ============================================================================

type SharedCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Mock push button.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use rs_blinkz::hal::MockButton;
/// use rs_blinkz::traits::ButtonSource;
///
/// let presses = Arc::new(AtomicUsize::new(0));
/// let mut button = MockButton::new();
///
/// let counter = presses.clone();
/// button.when_pressed(Box::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// button.press();
/// button.press();
/// assert_eq!(presses.load(Ordering::SeqCst), 2);
/// ```
#[derive(Clone, Default)]
pub struct MockButton {
    callback: Arc<Mutex<Option<SharedCallback>>>,
}

impl MockButton {
    /// Creates a button with no callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a press on the calling thread.
    ///
    /// Returns false if no callback is registered.
    pub fn press(&self) -> bool {
        let callback = lock(&self.callback).clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Returns true once a callback has been registered.
    pub fn has_callback(&self) -> bool {
        lock(&self.callback).is_some()
    }
}

impl ButtonSource for MockButton {
    fn when_pressed(&mut self, callback: PressCallback) {
        *lock(&self.callback) = Some(Arc::from(callback));
    }
}

impl core::fmt::Debug for MockButton {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MockButton")
            .field("has_callback", &self.has_callback())
            .finish()
    }
}

// ============================================================================
// Delay
// ============================================================================

type DelayHook = Arc<dyn Fn(u32) + Send + Sync + 'static>;

#[derive(Default)]
struct DelayInner {
    delays: Vec<u32>,
    hook: Option<DelayHook>,
}

/// Mock delay that returns immediately and records what was asked for.
///
/// An optional hook runs inside every delay, which lets a test act "during"
/// a hold (for example raise a termination flag mid-signal).
#[derive(Clone, Default)]
pub struct MockDelay {
    inner: Arc<Mutex<DelayInner>>,
}

impl MockDelay {
    /// Creates a delay with no hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `hook` with the requested duration on every delay.
    pub fn with_hook<F>(self, hook: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        lock(&self.inner).hook = Some(Arc::new(hook));
        self
    }

    /// Every requested delay, oldest first.
    pub fn delays(&self) -> Vec<u32> {
        lock(&self.inner).delays.clone()
    }

    /// Sum of all requested delays.
    pub fn total_ms(&self) -> u64 {
        lock(&self.inner).delays.iter().map(|&ms| u64::from(ms)).sum()
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        let hook = {
            let mut inner = lock(&self.inner);
            inner.delays.push(ms);
            inner.hook.clone()
        };
        if let Some(hook) = hook {
            hook(ms);
        }
    }
}

impl core::fmt::Debug for MockDelay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MockDelay")
            .field("delays", &lock(&self.inner).delays)
            .finish()
    }
}
