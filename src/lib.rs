//! # rs-blinkz
//!
//! Two small LED controllers built on one table-driven state machine: a
//! Morse-code beacon and a three-mode thermostat.
//!
//! ## Features
//!
//! - **Explicit automata**: `(state, event) -> state` tables with ordered entry and exit actions
//! - **Morse encoding**: lazy, restartable symbol sequences with correct dot/dash/gap timing
//! - **Thermostat**: `off -> heat -> cool` ring with pulse-or-steady indicators against a set point
//! - **Threaded runtime**: one worker per controller, button callbacks, cooperative cancellation
//! - **Hardware abstraction**: LEDs, LCD, sensor, serial and buttons behind traits
//!
//! ## Architecture
//!
//! - `traits` - Hardware capability contracts
//! - `fsm` - Generic state machine engine
//! - `morse` - Text to Morse symbol encoder
//! - `beacon` / `thermostat` - The two automata and their pure policy
//! - `services` - Shared state, worker loops, shutdown (requires `std`)
//! - `hal` - Mock and desktop implementations (requires `std`)
//!
//! ## Example
//!
//! ```rust
//! use rs_blinkz::{
//!     beacon::{beacon_machine, transmit_pass, BeaconOutputs, BeaconTiming, PassOutcome},
//!     hal::{MockDelay, MockLed},
//!     morse::encode,
//! };
//!
//! let delay = MockDelay::new();
//! let outputs = BeaconOutputs::new(MockLed::new(), MockLed::new(), delay.clone(), BeaconTiming::default());
//! let mut machine = beacon_machine(outputs).unwrap();
//!
//! // One pass of "OK": 5 dashes, 1 dot, 4 element gaps, 1 letter gap
//! let outcome = transmit_pass(&mut machine, encode("OK"), |_| true).unwrap();
//! assert_eq!(outcome, PassOutcome::Completed { symbols: 11 });
//! assert_eq!(delay.total_ms(), 5 * 1500 + 500 + 4 * 250 + 750);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Morse beacon automaton, timing and sending policy.
pub mod beacon;
/// Configuration for both controllers.
pub mod config;
/// Error types.
pub mod error;
/// Generic table-driven state machine.
pub mod fsm;
/// Hardware abstraction layer with mock and desktop implementations.
pub mod hal;
/// Morse-code symbol encoder.
pub mod morse;
/// Thermostat automaton and indicator planning.
pub mod thermostat;
/// Core traits for hardware abstraction.
pub mod traits;

/// Threaded runtime: shared state, worker loops and shutdown.
#[cfg(feature = "std")]
pub mod services;

// Re-exports for convenience
pub use beacon::{BeaconEvent, BeaconMachine, BeaconState, BeaconTiming};
pub use config::Config;
pub use error::{BuildError, ControlError, InvalidTransition};
pub use fsm::{MachineBuilder, MachineEvent, MachineState, StateMachine};
pub use morse::{encode, Signal, Symbol};
pub use thermostat::{ThermostatEvent, ThermostatMachine, ThermostatState};
pub use traits::{
    ButtonSource, CharacterDisplay, Delay, DigitalOutput, LedLevel, SerialPort, TemperatureSensor,
};
