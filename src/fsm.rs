//! Table-driven finite state machine with entry and exit actions.
//!
//! A machine is a closed set of states, a closed set of events, an explicit
//! transition table `(state, event) -> state`, and two ordered action lists
//! keyed by state. The machine owns a context value (the outputs the actions
//! drive), so actions are plain function pointers taking `&mut C`.
//!
//! # Firing
//!
//! [`StateMachine::fire`] looks up `(current, event)`. On a match it runs the
//! exit actions of the source state, switches `current`, then runs the entry
//! actions of the target state, all synchronously on the calling thread. An
//! action may block (for example to hold an LED on for a signal's duration);
//! `fire` returns only once the entry actions are done.
//!
//! A pair with no entry in the table is an [`InvalidTransition`], never a
//! silent no-op.
//!
//! # Example
//!
//! ```rust
//! use rs_blinkz::fsm::{MachineBuilder, MachineEvent, MachineState};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
//! enum Lamp { Dark, Lit }
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
//! enum Switch { Flip }
//!
//! impl MachineState for Lamp {
//!     fn name(&self) -> &'static str {
//!         match self { Lamp::Dark => "dark", Lamp::Lit => "lit" }
//!     }
//! }
//!
//! impl MachineEvent for Switch {
//!     fn name(&self) -> &'static str { "flip" }
//! }
//!
//! let mut machine = MachineBuilder::new(Lamp::Dark)
//!     .transition(Lamp::Dark, Switch::Flip, Lamp::Lit).unwrap()
//!     .on_enter(Lamp::Lit, |count: &mut u32| *count += 1)
//!     .build(0u32)
//!     .unwrap();
//!
//! machine.fire(Switch::Flip).unwrap();
//! assert_eq!(machine.current(), Lamp::Lit);
//! assert_eq!(*machine.context(), 1);
//!
//! // Lit has no outgoing transition
//! assert!(machine.fire(Switch::Flip).is_err());
//! ```

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::{BuildError, InvalidTransition};

/// A state identifier drawn from a closed enumeration.
pub trait MachineState: Copy + Ord + Debug {
    /// Stable lowercase name, used in errors, logs and serial records.
    fn name(&self) -> &'static str;
}

/// An event identifier drawn from a closed enumeration.
pub trait MachineEvent: Copy + Ord + Debug {
    /// Stable lowercase name, used in errors and logs.
    fn name(&self) -> &'static str;
}

/// Side-effecting procedure run on entering or leaving a state.
pub type Action<C> = fn(&mut C);

/// Static `(state, event) -> state` table.
#[derive(Clone, Debug)]
pub struct TransitionTable<S, E> {
    edges: BTreeMap<(S, E), S>,
}

impl<S: MachineState, E: MachineEvent> TransitionTable<S, E> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            edges: BTreeMap::new(),
        }
    }

    /// Adds `from --event--> to`.
    ///
    /// A second target for the same pair is rejected rather than overwritten.
    pub fn insert(&mut self, from: S, event: E, to: S) -> Result<(), BuildError> {
        if self.edges.contains_key(&(from, event)) {
            return Err(BuildError::DuplicateTransition {
                state: from.name(),
                event: event.name(),
            });
        }
        self.edges.insert((from, event), to);
        Ok(())
    }

    /// Target of `event` fired from `from`, if the pair is defined.
    pub fn target(&self, from: S, event: E) -> Option<S> {
        self.edges.get(&(from, event)).copied()
    }

    /// Events that are legal from `state`, in event order.
    pub fn events_from(&self, state: S) -> impl Iterator<Item = E> + '_ {
        self.edges
            .keys()
            .filter(move |(from, _)| *from == state)
            .map(|(_, event)| *event)
    }

    /// Number of defined transitions.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if no transitions are defined.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl<S: MachineState, E: MachineEvent> Default for TransitionTable<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent builder for [`StateMachine`].
pub struct MachineBuilder<S, E, C> {
    initial: S,
    table: TransitionTable<S, E>,
    on_enter: BTreeMap<S, Vec<Action<C>>>,
    on_exit: BTreeMap<S, Vec<Action<C>>>,
}

impl<S: MachineState, E: MachineEvent, C> MachineBuilder<S, E, C> {
    /// Starts a machine whose initial state is `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            table: TransitionTable::new(),
            on_enter: BTreeMap::new(),
            on_exit: BTreeMap::new(),
        }
    }

    /// Adds a transition. Fails on a duplicate `(from, event)` pair.
    pub fn transition(mut self, from: S, event: E, to: S) -> Result<Self, BuildError> {
        self.table.insert(from, event, to)?;
        Ok(self)
    }

    /// Adds the same event from each of `sources` to one target.
    pub fn transitions_to(mut self, sources: &[S], event: E, to: S) -> Result<Self, BuildError> {
        for &from in sources {
            self.table.insert(from, event, to)?;
        }
        Ok(self)
    }

    /// Appends an entry action for `state`. Actions run in insertion order.
    pub fn on_enter(mut self, state: S, action: Action<C>) -> Self {
        self.on_enter.entry(state).or_default().push(action);
        self
    }

    /// Appends an exit action for `state`. Actions run in insertion order.
    pub fn on_exit(mut self, state: S, action: Action<C>) -> Self {
        self.on_exit.entry(state).or_default().push(action);
        self
    }

    /// Finishes the machine, handing it the context its actions drive.
    pub fn build(self, context: C) -> Result<StateMachine<S, E, C>, BuildError> {
        if self.table.is_empty() {
            return Err(BuildError::NoTransitions);
        }

        Ok(StateMachine {
            table: self.table,
            on_enter: self.on_enter,
            on_exit: self.on_exit,
            initial: self.initial,
            current: self.initial,
            context,
        })
    }
}

/// A running finite automaton.
///
/// Not thread-safe by itself: `fire` takes `&mut self`, so concurrent firing
/// needs either a single owning thread or an outer `Mutex`.
pub struct StateMachine<S, E, C> {
    table: TransitionTable<S, E>,
    on_enter: BTreeMap<S, Vec<Action<C>>>,
    on_exit: BTreeMap<S, Vec<Action<C>>>,
    initial: S,
    current: S,
    context: C,
}

impl<S: MachineState, E: MachineEvent, C> StateMachine<S, E, C> {
    /// Fires `event` from the current state.
    ///
    /// Runs exit actions of the source, switches state, then runs entry
    /// actions of the target, each exactly once and in that order.
    pub fn fire(&mut self, event: E) -> Result<(), InvalidTransition> {
        let from = self.current;
        let to = self
            .table
            .target(from, event)
            .ok_or(InvalidTransition {
                state: from.name(),
                event: event.name(),
            })?;

        log::trace!("{} --{}--> {}", from.name(), event.name(), to.name());

        if let Some(actions) = self.on_exit.get(&from) {
            for action in actions {
                action(&mut self.context);
            }
        }

        self.current = to;

        if let Some(actions) = self.on_enter.get(&to) {
            for action in actions {
                action(&mut self.context);
            }
        }

        Ok(())
    }

    /// Returns true if `event` is legal from the current state.
    pub fn can_fire(&self, event: E) -> bool {
        self.table.target(self.current, event).is_some()
    }

    /// The state the machine is in.
    #[inline]
    pub fn current(&self) -> S {
        self.current
    }

    /// The state the machine started in.
    #[inline]
    pub fn initial(&self) -> S {
        self.initial
    }

    /// Returns true while in the initial state.
    #[inline]
    pub fn is_initial(&self) -> bool {
        self.current == self.initial
    }

    /// The transition table.
    pub fn table(&self) -> &TransitionTable<S, E> {
        &self.table
    }

    /// Shared access to the context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the context, bypassing the actions.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Consumes the machine and returns its context.
    pub fn into_context(self) -> C {
        self.context
    }
}
