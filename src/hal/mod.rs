//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test doubles whose clones share state, for inspecting a device
//!   after it was moved into a controller or a thread
//! - `console`: Desktop drivers (logging LEDs, stdout LCD and serial,
//!   simulated sensor, stdin buttons) used by the binaries
//!
//! Both need `std`; the traits themselves do not.

#[cfg(feature = "std")]
pub mod console;
#[cfg(feature = "std")]
pub mod mock;

#[cfg(feature = "std")]
pub use console::*;
#[cfg(feature = "std")]
pub use mock::*;
