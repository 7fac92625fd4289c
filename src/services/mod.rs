//! Threaded runtime for both controllers.
//!
//! Each controller runs one long-lived worker thread plus button callbacks
//! on whatever thread the input dispatcher uses. They meet in a
//! [`SharedControlState`] held in an `Arc`:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_blinkz::services::{message_toggle, spawn_transmitter, BeaconShared, Transmitter};
//!
//! let shared: Arc<BeaconShared> = Arc::new(SharedControlState::new(selection, BeaconState::Off));
//!
//! // Button callback and worker share the same state
//! button.when_pressed(message_toggle(Arc::clone(&shared)));
//! let worker = spawn_transmitter(Transmitter::new(machine, lcd, Arc::clone(&shared)))?;
//! ```

pub mod lifecycle;
pub mod shared;
pub mod status;
pub mod thermostat;
pub mod transmitter;

pub use lifecycle::*;
pub use shared::*;
pub use status::*;
pub use thermostat::*;
pub use transmitter::*;
