//! Error types shared by the state-machine engine and the controllers.
//!
//! The taxonomy follows how each failure is handled at runtime:
//!
//! | Error | Handling |
//! |-------|----------|
//! | [`InvalidTransition`] | Programming error: logged at error level, ends the loop |
//! | [`ControlError::SensorRead`] | Transient: logged, retried on the next tick |
//! | [`ControlError::Output`] | Logged, the loop proceeds to the next tick |
//! | [`ControlError::Release`] | Best-effort during shutdown: logged only |
//!
//! Characters with no Morse code are not an error; the encoder skips them.

use alloc::string::String;

/// An event was fired from a state that has no transition for it.
///
/// # Example
///
/// ```
/// use rs_blinkz::beacon::{BeaconEvent, BeaconOutputs, BeaconTiming};
/// use rs_blinkz::hal::{MockDelay, MockLed};
///
/// let outputs = BeaconOutputs::new(
///     MockLed::new(),
///     MockLed::new(),
///     MockDelay::new(),
///     BeaconTiming::default(),
/// );
/// let mut machine = rs_blinkz::beacon::beacon_machine(outputs).unwrap();
///
/// let err = machine.fire(BeaconEvent::GoOff).unwrap_err();
/// assert_eq!(err.state, "off");
/// assert_eq!(err.event, "go_off");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("no transition from state `{state}` on event `{event}`")]
pub struct InvalidTransition {
    /// Name of the state the machine was in.
    pub state: &'static str,
    /// Name of the rejected event.
    pub event: &'static str,
}

/// Errors raised while assembling a transition table.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The same `(state, event)` pair was given two targets.
    #[error("duplicate transition from state `{state}` on event `{event}`")]
    DuplicateTransition {
        /// Source state name.
        state: &'static str,
        /// Event name.
        event: &'static str,
    },

    /// The table has no transitions at all.
    #[error("no transitions defined")]
    NoTransitions,
}

/// Runtime failures of the controllers.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Fired an event that is illegal from the current state.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The temperature sensor could not be read.
    #[error("temperature sensor read failed: {0}")]
    SensorRead(String),

    /// An LED, display or serial write failed.
    #[error("output device error: {0}")]
    Output(String),

    /// A hardware resource could not be released.
    #[error("hardware release failed: {0}")]
    Release(String),
}

impl ControlError {
    /// Returns true for failures that should be retried on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, ControlError::SensorRead(_) | ControlError::Output(_))
    }
}
