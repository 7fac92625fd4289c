//! Beacon transmission loop.
//!
//! The [`Transmitter`] owns the beacon automaton and the display lease and
//! runs on a dedicated worker thread. Each pass:
//!
//! 1. snapshots the active message from the shared state,
//! 2. shows `Sending:` and the message on the LCD,
//! 3. sends every symbol through the automaton, polling `terminate` in
//!    between,
//! 4. holds one inter-word gap before the next pass.
//!
//! A message toggle from the button takes effect at the start of the next
//! pass. The display is released exactly once when the loop ends, however
//! it ends.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::beacon::{
    ensure_idle, transmit_pass, transmit_symbol, BeaconMachine, BeaconState, MessageSelection,
    PassOutcome,
};
use crate::config::short_string;
use crate::error::{ControlError, InvalidTransition};
use crate::morse::{encode, Symbol};
use crate::traits::{lcd_line, CharacterDisplay, Delay, DigitalOutput, DisplayLease, PressCallback};

use super::shared::SharedControlState;

/// Shared state of the beacon: the message selection and the automaton state.
pub type BeaconShared = SharedControlState<MessageSelection, BeaconState>;

/// Drives the beacon automaton until termination is requested.
pub struct Transmitter<R, B, D, L>
where
    R: DigitalOutput,
    B: DigitalOutput,
    D: Delay,
    L: CharacterDisplay,
{
    machine: BeaconMachine<R, B, D>,
    display: DisplayLease<L>,
    shared: Arc<BeaconShared>,
    passes: u64,
}

impl<R, B, D, L> Transmitter<R, B, D, L>
where
    R: DigitalOutput,
    B: DigitalOutput,
    D: Delay,
    L: CharacterDisplay,
{
    /// Creates a transmitter. The display is leased until the loop ends.
    pub fn new(machine: BeaconMachine<R, B, D>, display: L, shared: Arc<BeaconShared>) -> Self {
        Self {
            machine,
            display: DisplayLease::new(display),
            shared,
            passes: 0,
        }
    }

    /// Number of passes completed so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// The automaton, for inspection.
    pub fn machine(&self) -> &BeaconMachine<R, B, D> {
        &self.machine
    }

    /// Sends the active message once, followed by the gap between passes.
    ///
    /// Returns `Cancelled` as soon as termination is observed at a poll point.
    pub fn run_pass(&mut self) -> Result<PassOutcome, InvalidTransition> {
        let message = self
            .shared
            .with_value(|selection| short_string(selection.active()));

        if let Err(e) = self.display.show("Sending:", &lcd_line(&message)) {
            log::warn!("display update failed: {:?}", e);
        }
        log::info!("sending {:?}", message.as_str());

        let shared = &self.shared;
        let outcome = transmit_pass(&mut self.machine, encode(&message), |state| {
            shared.set_current_state(state);
            !shared.is_terminated()
        })?;
        self.shared.set_current_state(self.machine.current());

        if matches!(outcome, PassOutcome::Completed { .. }) {
            self.passes += 1;
            if !self.shared.is_terminated() {
                transmit_symbol(&mut self.machine, Symbol::InterWordGap)?;
                ensure_idle(&mut self.machine)?;
                self.shared.set_current_state(self.machine.current());
            }
        }
        Ok(outcome)
    }

    /// Runs passes until termination, then darkens the LEDs and releases the
    /// display.
    ///
    /// An [`InvalidTransition`] ends the loop and is returned; it means the
    /// transition table and the sending policy disagree.
    pub fn run(mut self) -> Result<u64, ControlError> {
        log::info!("transmitter started");
        let result = loop {
            if self.shared.is_terminated() {
                break Ok(self.passes);
            }
            match self.run_pass() {
                Ok(PassOutcome::Completed { symbols }) => {
                    log::debug!("pass {} complete ({} symbols)", self.passes, symbols);
                }
                Ok(PassOutcome::Cancelled { symbols }) => {
                    log::debug!("pass cancelled after {} symbols", symbols);
                }
                Err(e) => {
                    log::error!("transmission aborted: {}", e);
                    break Err(ControlError::from(e));
                }
            }
        };

        self.shutdown();
        result
    }

    fn shutdown(self) {
        let Transmitter {
            mut machine,
            display,
            shared,
            ..
        } = self;

        if ensure_idle(&mut machine).is_err() {
            machine.context_mut().darken();
        }
        shared.set_current_state(machine.current());

        if let Err(e) = display.release() {
            log::warn!("{}", ControlError::Release(format!("{:?}", e)));
        }
        log::info!("transmitter stopped");
    }
}

/// Starts `transmitter` on a named worker thread.
pub fn spawn_transmitter<R, B, D, L>(
    transmitter: Transmitter<R, B, D, L>,
) -> std::io::Result<JoinHandle<Result<u64, ControlError>>>
where
    R: DigitalOutput + Send + 'static,
    B: DigitalOutput + Send + 'static,
    D: Delay + Send + 'static,
    L: CharacterDisplay + Send + 'static,
{
    thread::Builder::new()
        .name("transmitter".into())
        .spawn(move || transmitter.run())
}

/// Button callback that toggles between the primary and alternate message.
///
/// The pass in progress finishes with the old message.
pub fn message_toggle(shared: Arc<BeaconShared>) -> PressCallback {
    Box::new(move || {
        let next = shared.with_value(|selection| short_string(selection.toggle()));
        log::info!("message toggled to {:?}", next.as_str());
    })
}
