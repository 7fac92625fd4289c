//! Morse beacon automaton.
//!
//! Six states: `off` (initial, idle), two signal states that light an LED
//! for the element's duration, and three pause states that hold the outputs
//! dark. Every signal and pause event is legal only from `off`, and the
//! idle-return event [`BeaconEvent::GoOff`] is legal from every other state,
//! so a transmission must always pass through `off` between symbols.
//!
//! ```text
//!            do_dot ──► dot ────────┐
//!            do_dash ─► dash ───────┤
//!   off ──── do_dot_dash_pause ─► dot_dash_pause ──┤ go_off ──► off
//!            do_letter_pause ──► letter_pause ─────┤
//!            do_word_pause ───► word_pause ────────┘
//! ```
//!
//! Entry actions block for the symbol's hold time, so
//! [`StateMachine::fire`](crate::fsm::StateMachine::fire) returns only after
//! the signal or pause has elapsed. Exit actions of the signal states switch
//! the LED off.
//!
//! # Example
//!
//! ```rust
//! use rs_blinkz::beacon::{beacon_machine, transmit_symbol, BeaconOutputs, BeaconState, BeaconTiming};
//! use rs_blinkz::hal::{MockDelay, MockLed};
//! use rs_blinkz::morse::{Signal, Symbol};
//!
//! let delay = MockDelay::new();
//! let outputs = BeaconOutputs::new(MockLed::new(), MockLed::new(), delay.clone(), BeaconTiming::from_unit_ms(1000));
//! let mut machine = beacon_machine(outputs).unwrap();
//!
//! transmit_symbol(&mut machine, Symbol::Signal(Signal::Dash)).unwrap();
//! assert_eq!(machine.current(), BeaconState::Dash);
//! assert_eq!(delay.delays(), vec![1500]);
//! ```

use crate::config::{short_string, BeaconConfig, ShortString};
use crate::error::{BuildError, InvalidTransition};
use crate::fsm::{MachineBuilder, MachineEvent, MachineState, StateMachine};
use crate::morse::{Signal, Symbol};
use crate::traits::{Delay, DigitalOutput};

/// Beacon states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BeaconState {
    /// Idle, all outputs dark.
    #[default]
    Off,
    /// Dot LED lit.
    Dot,
    /// Dash LED lit.
    Dash,
    /// Pause between elements of one character.
    DotDashPause,
    /// Pause between characters of one word.
    LetterPause,
    /// Pause between words.
    WordPause,
}

impl BeaconState {
    /// All states, idle first.
    pub const ALL: [BeaconState; 6] = [
        BeaconState::Off,
        BeaconState::Dot,
        BeaconState::Dash,
        BeaconState::DotDashPause,
        BeaconState::LetterPause,
        BeaconState::WordPause,
    ];

    /// Every state except `off`.
    pub const ACTIVE: [BeaconState; 5] = [
        BeaconState::Dot,
        BeaconState::Dash,
        BeaconState::DotDashPause,
        BeaconState::LetterPause,
        BeaconState::WordPause,
    ];
}

impl MachineState for BeaconState {
    fn name(&self) -> &'static str {
        match self {
            BeaconState::Off => "off",
            BeaconState::Dot => "dot",
            BeaconState::Dash => "dash",
            BeaconState::DotDashPause => "dot_dash_pause",
            BeaconState::LetterPause => "letter_pause",
            BeaconState::WordPause => "word_pause",
        }
    }
}

/// Beacon events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BeaconEvent {
    /// Light the dot LED.
    DoDot,
    /// Light the dash LED.
    DoDash,
    /// Hold the intra-character gap.
    DoDotDashPause,
    /// Hold the gap between letters.
    DoLetterPause,
    /// Hold the gap between words.
    DoWordPause,
    /// Return to idle from any other state.
    GoOff,
}

impl MachineEvent for BeaconEvent {
    fn name(&self) -> &'static str {
        match self {
            BeaconEvent::DoDot => "do_dot",
            BeaconEvent::DoDash => "do_dash",
            BeaconEvent::DoDotDashPause => "do_dot_dash_pause",
            BeaconEvent::DoLetterPause => "do_letter_pause",
            BeaconEvent::DoWordPause => "do_word_pause",
            BeaconEvent::GoOff => "go_off",
        }
    }
}

/// Event that transmits `symbol` from idle.
pub const fn event_for(symbol: Symbol) -> BeaconEvent {
    match symbol {
        Symbol::Signal(Signal::Dot) => BeaconEvent::DoDot,
        Symbol::Signal(Signal::Dash) => BeaconEvent::DoDash,
        Symbol::IntraCharacterGap => BeaconEvent::DoDotDashPause,
        Symbol::IntraWordGap => BeaconEvent::DoLetterPause,
        Symbol::InterWordGap => BeaconEvent::DoWordPause,
    }
}

/// The two configured messages and which one is on the air.
///
/// ```
/// use rs_blinkz::beacon::MessageSelection;
///
/// let mut selection = MessageSelection::new("SOS", "OK");
/// assert_eq!(selection.active(), "SOS");
/// selection.toggle();
/// assert_eq!(selection.active(), "OK");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageSelection {
    primary: ShortString,
    alternate: ShortString,
    alternate_active: bool,
}

impl MessageSelection {
    /// Starts on `primary`.
    pub fn new(primary: &str, alternate: &str) -> Self {
        Self {
            primary: short_string(primary),
            alternate: short_string(alternate),
            alternate_active: false,
        }
    }

    /// Selection built from the beacon config.
    pub fn from_config(config: &BeaconConfig) -> Self {
        Self {
            primary: config.primary_message.clone(),
            alternate: config.alternate_message.clone(),
            alternate_active: false,
        }
    }

    /// The message currently on the air.
    pub fn active(&self) -> &str {
        if self.alternate_active {
            &self.alternate
        } else {
            &self.primary
        }
    }

    /// Returns true while the alternate message is selected.
    pub fn is_alternate(&self) -> bool {
        self.alternate_active
    }

    /// Switches to the other message and returns it.
    pub fn toggle(&mut self) -> &str {
        self.alternate_active = !self.alternate_active;
        self.active()
    }
}

/// Hold times in milliseconds, derived from one time unit.
///
/// | Symbol | Units |
/// |--------|-------|
/// | dot | 0.5 |
/// | dash | 1.5 (3 dots) |
/// | intra-character gap | 0.25 |
/// | intra-word gap | 0.75 |
/// | inter-word gap | 3.0 |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeaconTiming {
    /// Dot hold.
    pub dot_ms: u32,
    /// Dash hold, always three dots.
    pub dash_ms: u32,
    /// Gap between elements of a character.
    pub symbol_gap_ms: u32,
    /// Gap between characters of a word.
    pub letter_gap_ms: u32,
    /// Gap between words.
    pub word_gap_ms: u32,
}

impl BeaconTiming {
    /// Derives every hold from the time unit.
    ///
    /// Holds saturate at `u32::MAX` rather than wrapping.
    pub const fn from_unit_ms(unit_ms: u32) -> Self {
        let dot_ms = unit_ms / 2;
        Self {
            dot_ms,
            dash_ms: dot_ms.saturating_mul(3),
            symbol_gap_ms: unit_ms / 4,
            letter_gap_ms: unit_ms / 4 * 3 + unit_ms % 4 * 3 / 4,
            word_gap_ms: unit_ms.saturating_mul(3),
        }
    }

    /// Hold time of `symbol`.
    pub const fn hold_ms(&self, symbol: Symbol) -> u32 {
        match symbol {
            Symbol::Signal(Signal::Dot) => self.dot_ms,
            Symbol::Signal(Signal::Dash) => self.dash_ms,
            Symbol::IntraCharacterGap => self.symbol_gap_ms,
            Symbol::IntraWordGap => self.letter_gap_ms,
            Symbol::InterWordGap => self.word_gap_ms,
        }
    }

    /// Longest single hold, which bounds cancellation latency.
    pub const fn longest_hold_ms(&self) -> u32 {
        let mut longest = self.dash_ms;
        if self.word_gap_ms > longest {
            longest = self.word_gap_ms;
        }
        longest
    }
}

impl Default for BeaconTiming {
    fn default() -> Self {
        Self::from_unit_ms(1000)
    }
}

/// Outputs driven by the beacon's entry and exit actions.
pub struct BeaconOutputs<R, B, D> {
    /// LED lit for dots.
    pub dot_led: R,
    /// LED lit for dashes.
    pub dash_led: B,
    /// Blocking delay used to hold each symbol.
    pub delay: D,
    /// Hold times.
    pub timing: BeaconTiming,
}

impl<R: DigitalOutput, B: DigitalOutput, D: Delay> BeaconOutputs<R, B, D> {
    /// Bundles the outputs.
    pub fn new(dot_led: R, dash_led: B, delay: D, timing: BeaconTiming) -> Self {
        Self {
            dot_led,
            dash_led,
            delay,
            timing,
        }
    }

    /// Switches both LEDs off.
    pub fn darken(&mut self) {
        if let Err(e) = self.dot_led.off() {
            log::warn!("dot LED off failed: {:?}", e);
        }
        if let Err(e) = self.dash_led.off() {
            log::warn!("dash LED off failed: {:?}", e);
        }
    }
}

/// The beacon automaton.
pub type BeaconMachine<R, B, D> = StateMachine<BeaconState, BeaconEvent, BeaconOutputs<R, B, D>>;

/// Builds the beacon automaton around `outputs`, starting in `off`.
pub fn beacon_machine<R, B, D>(
    outputs: BeaconOutputs<R, B, D>,
) -> Result<BeaconMachine<R, B, D>, BuildError>
where
    R: DigitalOutput,
    B: DigitalOutput,
    D: Delay,
{
    MachineBuilder::new(BeaconState::Off)
        .transition(BeaconState::Off, BeaconEvent::DoDot, BeaconState::Dot)?
        .transition(BeaconState::Off, BeaconEvent::DoDash, BeaconState::Dash)?
        .transition(
            BeaconState::Off,
            BeaconEvent::DoDotDashPause,
            BeaconState::DotDashPause,
        )?
        .transition(
            BeaconState::Off,
            BeaconEvent::DoLetterPause,
            BeaconState::LetterPause,
        )?
        .transition(
            BeaconState::Off,
            BeaconEvent::DoWordPause,
            BeaconState::WordPause,
        )?
        .transitions_to(&BeaconState::ACTIVE, BeaconEvent::GoOff, BeaconState::Off)?
        .on_enter(BeaconState::Dot, enter_dot::<R, B, D>)
        .on_exit(BeaconState::Dot, exit_dot::<R, B, D>)
        .on_enter(BeaconState::Dash, enter_dash::<R, B, D>)
        .on_exit(BeaconState::Dash, exit_dash::<R, B, D>)
        .on_enter(BeaconState::DotDashPause, enter_symbol_gap::<R, B, D>)
        .on_enter(BeaconState::LetterPause, enter_letter_gap::<R, B, D>)
        .on_enter(BeaconState::WordPause, enter_word_gap::<R, B, D>)
        .build(outputs)
}

fn enter_dot<R: DigitalOutput, B: DigitalOutput, D: Delay>(o: &mut BeaconOutputs<R, B, D>) {
    log::debug!("dot: {} ms", o.timing.dot_ms);
    if let Err(e) = o.dot_led.on() {
        log::warn!("dot LED on failed: {:?}", e);
    }
    o.delay.delay_ms(o.timing.dot_ms);
}

fn exit_dot<R: DigitalOutput, B: DigitalOutput, D: Delay>(o: &mut BeaconOutputs<R, B, D>) {
    if let Err(e) = o.dot_led.off() {
        log::warn!("dot LED off failed: {:?}", e);
    }
}

fn enter_dash<R: DigitalOutput, B: DigitalOutput, D: Delay>(o: &mut BeaconOutputs<R, B, D>) {
    log::debug!("dash: {} ms", o.timing.dash_ms);
    if let Err(e) = o.dash_led.on() {
        log::warn!("dash LED on failed: {:?}", e);
    }
    o.delay.delay_ms(o.timing.dash_ms);
}

fn exit_dash<R: DigitalOutput, B: DigitalOutput, D: Delay>(o: &mut BeaconOutputs<R, B, D>) {
    if let Err(e) = o.dash_led.off() {
        log::warn!("dash LED off failed: {:?}", e);
    }
}

fn enter_symbol_gap<R: DigitalOutput, B: DigitalOutput, D: Delay>(
    o: &mut BeaconOutputs<R, B, D>,
) {
    log::debug!("pause between elements: {} ms", o.timing.symbol_gap_ms);
    o.delay.delay_ms(o.timing.symbol_gap_ms);
}

fn enter_letter_gap<R: DigitalOutput, B: DigitalOutput, D: Delay>(
    o: &mut BeaconOutputs<R, B, D>,
) {
    log::debug!("pause between letters: {} ms", o.timing.letter_gap_ms);
    o.delay.delay_ms(o.timing.letter_gap_ms);
}

fn enter_word_gap<R: DigitalOutput, B: DigitalOutput, D: Delay>(o: &mut BeaconOutputs<R, B, D>) {
    log::debug!("pause between words: {} ms", o.timing.word_gap_ms);
    o.delay.delay_ms(o.timing.word_gap_ms);
}

/// Returns the automaton to `off` if it is anywhere else.
///
/// Only ever fires [`BeaconEvent::GoOff`], which the table defines from every
/// non-idle state.
pub fn ensure_idle<C>(
    machine: &mut StateMachine<BeaconState, BeaconEvent, C>,
) -> Result<(), InvalidTransition> {
    if machine.current() != BeaconState::Off {
        machine.fire(BeaconEvent::GoOff)?;
    }
    Ok(())
}

/// Transmits one symbol: return to idle, then fire the symbol's event.
///
/// Blocks for the symbol's hold time.
pub fn transmit_symbol<C>(
    machine: &mut StateMachine<BeaconState, BeaconEvent, C>,
    symbol: Symbol,
) -> Result<(), InvalidTransition> {
    ensure_idle(machine)?;
    machine.fire(event_for(symbol))
}

/// How a pass over a message ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// Every symbol was sent.
    Completed {
        /// Number of symbols sent.
        symbols: usize,
    },
    /// `keep_going` returned false before the message was finished.
    Cancelled {
        /// Number of symbols sent before cancelling.
        symbols: usize,
    },
}

/// Sends one full pass of `symbols`, polling `keep_going` before each one.
///
/// `keep_going` receives the state the automaton is in at the poll point.
/// Cancellation is only observed between symbols, never mid-hold. The
/// automaton is left in `off` either way.
pub fn transmit_pass<C, I, F>(
    machine: &mut StateMachine<BeaconState, BeaconEvent, C>,
    symbols: I,
    mut keep_going: F,
) -> Result<PassOutcome, InvalidTransition>
where
    I: IntoIterator<Item = Symbol>,
    F: FnMut(BeaconState) -> bool,
{
    let mut sent = 0;
    for symbol in symbols {
        if !keep_going(machine.current()) {
            ensure_idle(machine)?;
            return Ok(PassOutcome::Cancelled { symbols: sent });
        }
        transmit_symbol(machine, symbol)?;
        sent += 1;
    }
    ensure_idle(machine)?;
    Ok(PassOutcome::Completed { symbols: sent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, MockLed};
    use crate::morse::encode;
    use crate::traits::LedLevel;
    use alloc::vec;

    type TestMachine = BeaconMachine<MockLed, MockLed, MockDelay>;

    fn machine() -> (TestMachine, MockLed, MockLed, MockDelay) {
        let dot = MockLed::new();
        let dash = MockLed::new();
        let delay = MockDelay::new();
        let outputs = BeaconOutputs::new(
            dot.clone(),
            dash.clone(),
            delay.clone(),
            BeaconTiming::default(),
        );
        (beacon_machine(outputs).unwrap(), dot, dash, delay)
    }

    #[test]
    fn timing_from_unit() {
        let t = BeaconTiming::from_unit_ms(1000);
        assert_eq!(t.dot_ms, 500);
        assert_eq!(t.dash_ms, 1500);
        assert_eq!(t.symbol_gap_ms, 250);
        assert_eq!(t.letter_gap_ms, 750);
        assert_eq!(t.word_gap_ms, 3000);
        assert_eq!(t.longest_hold_ms(), 3000);
    }

    #[test]
    fn dash_is_three_dots_for_odd_units() {
        for unit in [1, 3, 7, 99, 1001] {
            let t = BeaconTiming::from_unit_ms(unit);
            assert_eq!(t.dash_ms, 3 * t.dot_ms);
        }
    }

    #[test]
    fn huge_unit_saturates_instead_of_overflowing() {
        let t = BeaconTiming::from_unit_ms(u32::MAX);
        assert_eq!(t.dot_ms, u32::MAX / 2);
        assert_eq!(t.dash_ms, u32::MAX);
        assert_eq!(t.word_gap_ms, u32::MAX);
        assert_eq!(t.letter_gap_ms, 3_221_225_471);
        assert_eq!(t.longest_hold_ms(), u32::MAX);
    }

    #[test]
    fn starts_idle_and_dark() {
        let (machine, dot, dash, _) = machine();
        assert_eq!(machine.current(), BeaconState::Off);
        assert_eq!(dot.level(), LedLevel::Off);
        assert_eq!(dash.level(), LedLevel::Off);
    }

    #[test]
    fn dot_then_idle_then_dot_again() {
        let (mut machine, dot, _, delay) = machine();

        machine.fire(BeaconEvent::DoDot).unwrap();
        assert_eq!(machine.current(), BeaconState::Dot);
        assert_eq!(dot.level(), LedLevel::On);
        assert_eq!(delay.delays(), vec![500]);

        machine.fire(BeaconEvent::GoOff).unwrap();
        assert_eq!(machine.current(), BeaconState::Off);
        assert_eq!(dot.level(), LedLevel::Off);

        machine.fire(BeaconEvent::DoDot).unwrap();
        assert_eq!(machine.current(), BeaconState::Dot);
    }

    #[test]
    fn dot_from_dot_is_invalid() {
        let (mut machine, _, _, _) = machine();
        machine.fire(BeaconEvent::DoDot).unwrap();

        let err = machine.fire(BeaconEvent::DoDot).unwrap_err();
        assert_eq!(err.state, "dot");
        assert_eq!(err.event, "do_dot");
        assert_eq!(machine.current(), BeaconState::Dot);
    }

    #[test]
    fn go_off_from_off_is_invalid() {
        let (mut machine, _, _, _) = machine();
        assert!(machine.fire(BeaconEvent::GoOff).is_err());
    }

    #[test]
    fn go_off_legal_from_every_active_state() {
        for state in BeaconState::ACTIVE {
            let (machine, _, _, _) = machine();
            assert_eq!(
                machine.table().target(state, BeaconEvent::GoOff),
                Some(BeaconState::Off),
                "{state:?}"
            );
        }
    }

    #[test]
    fn only_go_off_leaves_active_states() {
        let (machine, _, _, _) = machine();
        for state in BeaconState::ACTIVE {
            let events: alloc::vec::Vec<_> = machine.table().events_from(state).collect();
            assert_eq!(events, vec![BeaconEvent::GoOff]);
        }
        assert_eq!(machine.table().events_from(BeaconState::Off).count(), 5);
    }

    #[test]
    fn dash_lights_dash_led_only() {
        let (mut machine, dot, dash, delay) = machine();
        machine.fire(BeaconEvent::DoDash).unwrap();
        assert_eq!(dash.level(), LedLevel::On);
        assert_eq!(dot.level(), LedLevel::Off);
        assert_eq!(delay.delays(), vec![1500]);

        machine.fire(BeaconEvent::GoOff).unwrap();
        assert_eq!(dash.level(), LedLevel::Off);
    }

    #[test]
    fn pauses_hold_dark() {
        let (mut machine, dot, dash, delay) = machine();
        for event in [
            BeaconEvent::DoDotDashPause,
            BeaconEvent::DoLetterPause,
            BeaconEvent::DoWordPause,
        ] {
            machine.fire(event).unwrap();
            machine.fire(BeaconEvent::GoOff).unwrap();
        }
        assert_eq!(delay.delays(), vec![250, 750, 3000]);
        assert!(dot.history().is_empty());
        assert!(dash.history().is_empty());
    }

    #[test]
    fn transmit_symbol_returns_to_idle_first() {
        let (mut machine, dot, _, _) = machine();
        transmit_symbol(&mut machine, Symbol::Signal(Signal::Dot)).unwrap();
        transmit_symbol(&mut machine, Symbol::Signal(Signal::Dot)).unwrap();

        // on, off (go_off), on
        assert_eq!(
            dot.history(),
            vec![LedLevel::On, LedLevel::Off, LedLevel::On]
        );
    }

    #[test]
    fn full_pass_of_sos() {
        let (mut machine, dot, dash, delay) = machine();
        let outcome = transmit_pass(&mut machine, encode("SOS"), |_| true).unwrap();

        assert_eq!(outcome, PassOutcome::Completed { symbols: 17 });
        assert_eq!(machine.current(), BeaconState::Off);
        assert_eq!(dot.level(), LedLevel::Off);

        let ons = |led: &MockLed| led.history().iter().filter(|l| **l == LedLevel::On).count();
        assert_eq!(ons(&dot), 6);
        assert_eq!(ons(&dash), 3);

        // 6 dots, 3 dashes, 6 element gaps, 2 letter gaps
        let total: u32 = delay.delays().iter().sum();
        assert_eq!(total, 6 * 500 + 3 * 1500 + 6 * 250 + 2 * 750);
    }

    #[test]
    fn pass_cancelled_between_symbols() {
        let (mut machine, dot, _, delay) = machine();
        let mut polls = 0;
        let outcome = transmit_pass(&mut machine, encode("SOS"), |_| {
            polls += 1;
            polls <= 3
        })
        .unwrap();

        assert_eq!(outcome, PassOutcome::Cancelled { symbols: 3 });
        assert_eq!(machine.current(), BeaconState::Off);
        assert_eq!(dot.level(), LedLevel::Off);
        assert_eq!(delay.delays(), vec![500, 250, 500]);
    }

    #[test]
    fn keep_going_sees_current_state() {
        let (mut machine, _, _, _) = machine();
        let mut seen = alloc::vec::Vec::new();
        transmit_pass(&mut machine, encode("A"), |state| {
            seen.push(state);
            true
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![BeaconState::Off, BeaconState::Dot, BeaconState::DotDashPause]
        );
    }

    #[test]
    fn selection_toggles_back_and_forth() {
        let mut selection = MessageSelection::from_config(&BeaconConfig::default());
        assert!(!selection.is_alternate());
        assert_eq!(selection.toggle(), "OK");
        assert_eq!(selection.toggle(), "SOS");
        assert!(!selection.is_alternate());
    }

    #[test]
    fn empty_pass_sends_nothing() {
        let (mut machine, _, _, delay) = machine();
        let outcome = transmit_pass(&mut machine, encode("?!"), |_| true).unwrap();
        assert_eq!(outcome, PassOutcome::Completed { symbols: 0 });
        assert!(delay.delays().is_empty());
    }
}
