//! Capability traits for the physical collaborators.
//!
//! This module defines the abstractions that let rs-blinkz:
//! - Run against real GPIO/I2C/UART drivers on a single-board computer
//! - Run on a desktop with the simulation drivers in `hal::console`
//! - Run under test with the recording doubles in `hal::mock`
//!
//! # Submodules
//!
//! - `hardware`: LED outputs, temperature sensor, serial port, buttons, delay
//! - `display`: Two-line character LCD and its scoped lease
//!
//! # Hardware Abstraction
//!
//! - [`DigitalOutput`]: LED with on/off/pulse
//! - [`CharacterDisplay`]: 16x2 character display
//! - [`TemperatureSensor`]: Celsius reading, serialized by the caller
//! - [`SerialPort`]: Line-oriented serial writes
//! - [`ButtonSource`]: Asynchronous press callbacks
//! - [`Delay`]: Blocking hold used by state entry actions

pub mod display;
pub mod hardware;

pub use display::*;
pub use hardware::*;
