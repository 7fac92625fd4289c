//! Morse beacon on the desktop drivers.
//!
//! Sends the primary message on the red (dot) and blue (dash) LEDs, with
//! `Sending:` and the message on the LCD. Type `toggle` and Enter to switch
//! to the alternate message; it takes effect at the next pass. Ctrl-C stops
//! the beacon after the current symbol.
//!
//! # Environment
//!
//! ```bash
//! RUST_LOG=debug BLINKZ_PRIMARY_MESSAGE="CQ CQ" BLINKZ_TIME_UNIT_MS=300 cargo run --bin beacon
//! ```

use std::sync::Arc;

use anyhow::Context;
use rs_blinkz::beacon::{beacon_machine, BeaconOutputs, BeaconState, MessageSelection};
use rs_blinkz::hal::{ConsoleDisplay, ConsoleLed, StdinButtons, ThreadDelay};
use rs_blinkz::morse::is_encodable;
use rs_blinkz::services::{
    join_with_grace, message_toggle, register_interrupts, spawn_transmitter, wait_for_interrupt,
    SharedControlState, ShutdownOutcome, Transmitter,
};
use rs_blinkz::traits::ButtonSource;
use rs_blinkz::Config;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let beacon = &config.beacon;
    for message in [&beacon.primary_message, &beacon.alternate_message] {
        if !is_encodable(message) {
            log::warn!("{:?} has characters with no Morse code; they are skipped", message.as_str());
        }
    }

    // =========================================================================
    // Automaton and shared state
    // =========================================================================
    let outputs = BeaconOutputs::new(
        ConsoleLed::new("red"),
        ConsoleLed::new("blue"),
        ThreadDelay,
        beacon.timing(),
    );
    let machine = beacon_machine(outputs).context("building beacon automaton")?;
    let shared = Arc::new(SharedControlState::new(
        MessageSelection::from_config(beacon),
        BeaconState::Off,
    ));

    // =========================================================================
    // Inputs
    // =========================================================================
    let buttons = StdinButtons::new();
    buttons
        .button("toggle")
        .when_pressed(message_toggle(Arc::clone(&shared)));
    buttons.spawn_reader().context("starting stdin reader")?;

    let interrupted = register_interrupts().context("registering signal handlers")?;

    // =========================================================================
    // Run until interrupted
    // =========================================================================
    let transmitter = Transmitter::new(machine, ConsoleDisplay::new(), Arc::clone(&shared));
    let worker = spawn_transmitter(transmitter).context("starting transmitter")?;
    log::info!(
        "beacon running ({} ms unit); type `toggle` to switch messages",
        beacon.time_unit_ms
    );

    // A hold in progress always runs to completion.
    let shutdown = config
        .shutdown
        .clone()
        .with_grace_ms(config.shutdown.grace_ms.max(beacon.timing().longest_hold_ms()));

    wait_for_interrupt(&interrupted, &shutdown);
    shared.request_terminate();

    match join_with_grace(worker, &shutdown) {
        ShutdownOutcome::Finished(result) => {
            let passes = result?;
            log::info!("beacon stopped after {} passes", passes);
        }
        ShutdownOutcome::Panicked => anyhow::bail!("transmitter panicked"),
        ShutdownOutcome::TimedOut(_) => {
            log::warn!("transmitter did not stop within the grace period");
        }
    }
    Ok(())
}
