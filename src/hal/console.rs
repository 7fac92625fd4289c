//! Desktop drivers that stand in for the board.
//!
//! LEDs and the LCD log or print, the sensor drifts around a base
//! temperature, and buttons are lines typed on stdin. Both binaries run on a
//! workstation with these.
//!
//! | Driver | Trait | Backing |
//! |--------|-------|---------|
//! | [`ConsoleLed`] | `DigitalOutput` | `log::info!` on every change |
//! | [`ConsoleDisplay`] | `CharacterDisplay` | framed lines on stdout |
//! | [`SimulatedSensor`] | `TemperatureSensor` | triangle wave around a base |
//! | [`StdoutSerial`] | `SerialPort` | stdout |
//! | [`StdinButtons`] | `ButtonSource` | one command word per button |
//! | [`ThreadDelay`] | `Delay` | `std::thread::sleep` |

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::io::{self, BufRead, Write};
use std::string::String;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::services::shared::lock_recovering;
use crate::traits::{
    ButtonSource, CharacterDisplay, Delay, DigitalOutput, LedLevel, PressCallback, SerialPort,
    TemperatureSensor, LCD_COLUMNS,
};

// ============================================================================
// Outputs
// ============================================================================

/// LED that logs its level.
#[derive(Debug)]
pub struct ConsoleLed {
    name: &'static str,
    level: LedLevel,
}

impl ConsoleLed {
    /// Creates a dark LED called `name`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            level: LedLevel::Off,
        }
    }

    /// Current level.
    pub fn level(&self) -> LedLevel {
        self.level
    }

    fn set(&mut self, level: LedLevel) {
        if self.level != level {
            log::info!("[{} led] {}", self.name, level.as_str());
        }
        self.level = level;
    }
}

impl DigitalOutput for ConsoleLed {
    type Error = Infallible;

    fn on(&mut self) -> Result<(), Infallible> {
        self.set(LedLevel::On);
        Ok(())
    }

    fn off(&mut self) -> Result<(), Infallible> {
        self.set(LedLevel::Off);
        Ok(())
    }

    fn pulse(&mut self, _fade_in_ms: u32, _fade_out_ms: u32) -> Result<(), Infallible> {
        self.set(LedLevel::Pulsing);
        Ok(())
    }
}

/// 16x2 LCD drawn on stdout.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    last: Option<[String; 2]>,
}

impl ConsoleDisplay {
    /// Creates the display.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CharacterDisplay for ConsoleDisplay {
    type Error = io::Error;

    fn update(&mut self, lines: [&str; 2]) -> io::Result<()> {
        let frame = [lines[0].to_string(), lines[1].to_string()];
        if self.last.as_ref() == Some(&frame) {
            return Ok(());
        }

        let mut out = io::stdout().lock();
        let border = "-".repeat(LCD_COLUMNS + 2);
        writeln!(out, "+{}+", border)?;
        for line in &frame {
            writeln!(out, "| {:<width$} |", line, width = LCD_COLUMNS)?;
        }
        writeln!(out, "+{}+", border)?;
        out.flush()?;

        self.last = Some(frame);
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.last = None;
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        self.clear()?;
        log::info!("display released");
        Ok(())
    }
}

/// Serial port that prints each record on stdout.
#[derive(Debug, Default)]
pub struct StdoutSerial;

impl SerialPort for StdoutSerial {
    type Error = io::Error;

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "serial> {}", text)?;
        out.flush()
    }
}

// ============================================================================
// Sensor
// ============================================================================

/// Sensor whose reading walks up and down around a base temperature.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    base_celsius: f32,
    step_celsius: f32,
    span_steps: i32,
    offset: i32,
    rising: bool,
}

impl SimulatedSensor {
    /// Walks between `base - span*step` and `base + span*step`, one step per
    /// read.
    pub fn new(base_celsius: f32, step_celsius: f32, span_steps: i32) -> Self {
        Self {
            base_celsius,
            step_celsius,
            span_steps: span_steps.max(0),
            offset: 0,
            rising: true,
        }
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new(22.0, 0.1, 20)
    }
}

impl TemperatureSensor for SimulatedSensor {
    type Error = Infallible;

    fn read_celsius(&mut self) -> Result<f32, Infallible> {
        let reading = self.base_celsius + self.offset as f32 * self.step_celsius;
        if self.rising && self.offset >= self.span_steps {
            self.rising = false;
        } else if !self.rising && self.offset <= -self.span_steps {
            self.rising = true;
        }
        self.offset += if self.rising { 1 } else { -1 };
        Ok(reading)
    }
}

// ============================================================================
// Buttons
// ============================================================================

type SharedCallback = Arc<dyn Fn() + Send + Sync + 'static>;
type Registry = Arc<Mutex<BTreeMap<String, SharedCallback>>>;

/// Maps words typed on stdin to button presses.
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use rs_blinkz::hal::StdinButtons;
/// use rs_blinkz::traits::ButtonSource;
///
/// let buttons = StdinButtons::new();
/// let pressed = Arc::new(AtomicBool::new(false));
/// let flag = pressed.clone();
///
/// buttons.button("toggle").when_pressed(Box::new(move || flag.store(true, Ordering::SeqCst)));
///
/// assert!(buttons.dispatch("  toggle \n"));
/// assert!(!buttons.dispatch("unknown"));
/// assert!(pressed.load(Ordering::SeqCst));
/// ```
#[derive(Clone, Default)]
pub struct StdinButtons {
    registry: Registry,
}

impl StdinButtons {
    /// Creates an empty button set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A button pressed by typing `command`.
    pub fn button(&self, command: &str) -> StdinButton {
        StdinButton {
            command: command.trim().to_string(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Registered command words, sorted.
    pub fn commands(&self) -> Vec<String> {
        lock_recovering(&self.registry).keys().cloned().collect()
    }

    /// Presses the button named by `line`; returns false if none matches.
    pub fn dispatch(&self, line: &str) -> bool {
        let callback = lock_recovering(&self.registry).get(line.trim()).cloned();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Reads stdin on a background thread until EOF.
    pub fn spawn_reader(&self) -> io::Result<JoinHandle<()>> {
        let buttons = self.clone();
        thread::Builder::new()
            .name("stdin-buttons".into())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            log::warn!("stdin: {}", e);
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    if !buttons.dispatch(&line) {
                        log::warn!(
                            "unknown button {:?}; try one of {:?}",
                            line.trim(),
                            buttons.commands()
                        );
                    }
                }
                log::debug!("stdin closed");
            })
    }
}

/// One named button of a [`StdinButtons`] set.
pub struct StdinButton {
    command: String,
    registry: Registry,
}

impl ButtonSource for StdinButton {
    fn when_pressed(&mut self, callback: PressCallback) {
        lock_recovering(&self.registry).insert(self.command.clone(), Arc::from(callback));
    }
}

// ============================================================================
// Delay
// ============================================================================

/// Blocking delay backed by `thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
