//! Thermostat status worker: LCD, serial line and periodic relight.
//!
//! The cadence lives in [`StatusTicker`], a pure counter so it can be tested
//! without threads or clocks. With the default config:
//!
//! | Tick | LCD line 2 | Other |
//! |------|------------|-------|
//! | 1-5 | `Temp:71F` | |
//! | 6-10 | `Heat:72F` | |
//! | 11 | `Temp:71F` | lights re-evaluated, cycle restarts |
//! | 30, 60, ... | | serial record `heat,71,72` |

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{Local, NaiveDateTime};

use crate::config::ThermostatConfig;
use crate::error::ControlError;
use crate::thermostat::ThermostatState;
use crate::traits::{
    lcd_format, lcd_line_padded, CharacterDisplay, Delay, DigitalOutput, DisplayLease, LcdLine,
    SerialPort, TemperatureSensor,
};

use super::thermostat::ThermostatController;

// ============================================================================
// Ticker
// ============================================================================

/// What the second LCD line shows on a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecondLine {
    /// `Temp:<F>F`
    Temperature,
    /// `<Mode>:<setPoint>F`
    ModeAndSetPoint,
}

/// Work scheduled for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickPlan {
    /// 1-based position within the alternation cycle.
    pub position: u32,
    /// Second-line content.
    pub second_line: SecondLine,
    /// Re-run the light evaluation this tick.
    pub relight: bool,
    /// Emit a serial status record this tick.
    pub emit_serial: bool,
}

/// Deterministic tick counter for the status worker.
#[derive(Clone, Debug)]
pub struct StatusTicker {
    alternate_every: u32,
    serial_every: u32,
    position: u32,
    serial_count: u32,
}

impl StatusTicker {
    /// Creates a ticker; both periods are clamped to at least one tick.
    pub fn new(alternate_every: u32, serial_every: u32) -> Self {
        Self {
            alternate_every: alternate_every.max(1),
            serial_every: serial_every.max(1),
            position: 0,
            serial_count: 0,
        }
    }

    /// Ticker using the config's periods.
    pub fn from_config(config: &ThermostatConfig) -> Self {
        Self::new(config.alternate_every, config.serial_every)
    }

    /// Advances one tick.
    pub fn tick(&mut self) -> TickPlan {
        let mut relight = false;
        self.position += 1;
        if self.position > 2 * self.alternate_every {
            self.position = 1;
            relight = true;
        }

        self.serial_count += 1;
        let emit_serial = self.serial_count >= self.serial_every;
        if emit_serial {
            self.serial_count = 0;
        }

        let second_line = if self.position <= self.alternate_every {
            SecondLine::Temperature
        } else {
            SecondLine::ModeAndSetPoint
        };

        TickPlan {
            position: self.position,
            second_line,
            relight,
            emit_serial,
        }
    }
}

// ============================================================================
// Wall clock
// ============================================================================

/// Source of local date and time for the first LCD line.
pub trait WallClock {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The system's local time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stopped at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedWallClock(pub NaiveDateTime);

impl WallClock for FixedWallClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// `YYYY-MM-DD HH:MM`
pub fn clock_line(now: NaiveDateTime) -> LcdLine {
    lcd_format(format_args!("{}", now.format("%Y-%m-%d %H:%M")))
}

/// `Temp:<F>F`, or `Temp:--F` without a reading, padded to the LCD width.
pub fn temperature_line(temperature_f: Option<i32>) -> LcdLine {
    match temperature_f {
        Some(t) => lcd_line_padded(&lcd_format(format_args!("Temp:{}F", t))),
        None => lcd_line_padded("Temp:--F"),
    }
}

/// `<Mode>:<setPoint>F`, padded to the LCD width.
pub fn mode_line(mode: ThermostatState, set_point: i32) -> LcdLine {
    lcd_line_padded(&lcd_format(format_args!("{}:{}F", mode.title(), set_point)))
}

// ============================================================================
// Worker
// ============================================================================

const SLEEP_SLICE_MS: u32 = 100;

/// Periodic display and serial task of the thermostat.
pub struct StatusWorker<H, C, T, L, P, D, K>
where
    L: CharacterDisplay,
{
    controller: Arc<ThermostatController<H, C, T>>,
    display: DisplayLease<L>,
    serial: P,
    delay: D,
    clock: K,
    ticker: StatusTicker,
    tick_ms: u32,
    ticks: u64,
}

impl<H, C, T, L, P, D, K> StatusWorker<H, C, T, L, P, D, K>
where
    H: DigitalOutput,
    C: DigitalOutput,
    T: TemperatureSensor,
    L: CharacterDisplay,
    P: SerialPort,
    D: Delay,
    K: WallClock,
{
    /// Creates the worker. The display is leased until the loop ends.
    pub fn new(
        controller: Arc<ThermostatController<H, C, T>>,
        display: L,
        serial: P,
        delay: D,
        clock: K,
        config: &ThermostatConfig,
    ) -> Self {
        Self {
            controller,
            display: DisplayLease::new(display),
            serial,
            delay,
            clock,
            ticker: StatusTicker::from_config(config),
            tick_ms: config.tick_ms,
            ticks: 0,
        }
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one tick without sleeping.
    pub fn tick(&mut self) -> TickPlan {
        let plan = self.ticker.tick();
        self.ticks += 1;

        if plan.relight {
            if let Err(e) = self.controller.update_lights() {
                log::warn!("periodic relight: {}", e);
            }
        }

        let line1 = clock_line(self.clock.now());
        let line2 = match plan.second_line {
            SecondLine::Temperature => {
                let reading = self.controller.temperature_f();
                if let Err(e) = &reading {
                    log::warn!("{}", e);
                }
                temperature_line(reading.ok())
            }
            SecondLine::ModeAndSetPoint => {
                mode_line(self.controller.mode(), self.controller.set_point())
            }
        };
        if let Err(e) = self.display.show(&line1, &line2) {
            log::warn!("display update failed: {:?}", e);
        }

        if plan.emit_serial {
            match self.controller.status_record() {
                Ok(record) => {
                    let line = record.to_string();
                    log::debug!("serial: {}", line);
                    if let Err(e) = self.serial.write_line(&line) {
                        log::warn!("serial write failed: {:?}", e);
                    }
                }
                Err(e) => log::warn!("status record skipped: {}", e),
            }
        }

        plan
    }

    /// Ticks until termination, then releases the display.
    ///
    /// Returns the number of ticks. A failed release is logged only.
    pub fn run(mut self) -> u64 {
        log::info!("status worker started ({} ms tick)", self.tick_ms);
        let shared = Arc::clone(self.controller.shared());
        while !shared.is_terminated() {
            self.tick();

            // Termination is polled between slices of the tick.
            let mut remaining = self.tick_ms;
            while remaining > 0 && !shared.is_terminated() {
                let slice = remaining.min(SLEEP_SLICE_MS);
                self.delay.delay_ms(slice);
                remaining -= slice;
            }
        }

        let ticks = self.ticks;
        if let Err(e) = self.display.release() {
            log::warn!("{}", ControlError::Release(format!("{:?}", e)));
        }
        log::info!("status worker stopped after {} ticks", ticks);
        ticks
    }
}

/// Starts `worker` on a named thread.
pub fn spawn_status_worker<H, C, T, L, P, D, K>(
    worker: StatusWorker<H, C, T, L, P, D, K>,
) -> std::io::Result<JoinHandle<u64>>
where
    H: DigitalOutput + Send + 'static,
    C: DigitalOutput + Send + 'static,
    T: TemperatureSensor + Send + 'static,
    L: CharacterDisplay + Send + 'static,
    P: SerialPort + Send + 'static,
    D: Delay + Send + 'static,
    K: WallClock + Send + 'static,
{
    thread::Builder::new()
        .name("status".into())
        .spawn(move || worker.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // ========================================================================
    // Ticker
    // ========================================================================

    #[test]
    fn alternation_with_defaults() {
        let mut ticker = StatusTicker::new(5, 30);
        let lines: Vec<SecondLine> = (0..11).map(|_| ticker.tick().second_line).collect();

        assert!(lines[..5].iter().all(|l| *l == SecondLine::Temperature));
        assert!(lines[5..10].iter().all(|l| *l == SecondLine::ModeAndSetPoint));
        assert_eq!(lines[10], SecondLine::Temperature);
    }

    #[test]
    fn relight_on_wrap_only() {
        let mut ticker = StatusTicker::new(5, 30);
        let relights: Vec<u32> = (1..=31)
            .filter_map(|n| ticker.tick().relight.then_some(n))
            .collect();
        assert_eq!(relights, vec![11, 21, 31]);
    }

    #[test]
    fn serial_once_per_period() {
        let mut ticker = StatusTicker::new(5, 30);
        let emits: Vec<u32> = (1..=90)
            .filter_map(|n| ticker.tick().emit_serial.then_some(n))
            .collect();
        assert_eq!(emits, vec![30, 60, 90]);
    }

    #[test]
    fn periods_clamped() {
        let mut ticker = StatusTicker::new(0, 0);
        let first = ticker.tick();
        assert!(first.emit_serial);
        assert_eq!(first.second_line, SecondLine::Temperature);
        assert_eq!(ticker.tick().second_line, SecondLine::ModeAndSetPoint);
    }

    // ========================================================================
    // Formatting
    // ========================================================================

    #[test]
    fn clock_line_format() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 59)
            .unwrap();
        assert_eq!(clock_line(now).as_str(), "2024-03-07 09:05");
        assert_eq!(FixedWallClock(now).now(), now);
    }

    #[test]
    fn second_lines_are_padded() {
        assert_eq!(temperature_line(Some(71)).as_str(), "Temp:71F        ");
        assert_eq!(temperature_line(None).as_str(), "Temp:--F        ");
        assert_eq!(
            mode_line(ThermostatState::Heat, 72).as_str(),
            "Heat:72F        "
        );
        assert_eq!(mode_line(ThermostatState::Off, -100).len(), 16);
    }
}
