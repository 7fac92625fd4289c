//! Thermostat on the desktop drivers.
//!
//! The LCD shows the date and time on line 1 and alternates temperature and
//! mode/set point on line 2; a CSV status record goes to stdout every 30
//! ticks. Type `mode`, `up` or `down` and Enter to press a button. Ctrl-C
//! shuts down.
//!
//! # Environment
//!
//! ```bash
//! RUST_LOG=debug BLINKZ_SET_POINT=68 BLINKZ_TICK_MS=250 cargo run --bin thermostat
//! ```

use std::sync::Arc;

use anyhow::Context;
use rs_blinkz::hal::{
    ConsoleDisplay, ConsoleLed, SimulatedSensor, StdinButtons, StdoutSerial, ThreadDelay,
};
use rs_blinkz::services::{
    join_with_grace, register_interrupts, spawn_status_worker, wait_for_interrupt, SensorBus,
    SharedControlState, ShutdownOutcome, StatusWorker, SystemWallClock, ThermostatController,
};
use rs_blinkz::thermostat::{thermostat_machine, ThermostatLights, ThermostatState};
use rs_blinkz::traits::ButtonSource;
use rs_blinkz::Config;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let settings = &config.thermostat;

    // =========================================================================
    // Automaton and controller
    // =========================================================================
    let lights = ThermostatLights::new(
        ConsoleLed::new("red"),
        ConsoleLed::new("blue"),
        settings.pulse_fade_ms,
    );
    let machine = thermostat_machine(lights).context("building thermostat automaton")?;
    let shared = Arc::new(SharedControlState::new(
        settings.initial_set_point,
        ThermostatState::Off,
    ));
    let controller = Arc::new(ThermostatController::new(
        machine,
        SensorBus::new(SimulatedSensor::default()),
        Arc::clone(&shared),
        settings.set_point_step,
    ));
    if let Err(e) = controller.update_lights() {
        log::warn!("initial light update: {}", e);
    }

    // =========================================================================
    // Inputs
    // =========================================================================
    let buttons = StdinButtons::new();
    buttons
        .button("mode")
        .when_pressed(controller.cycle_callback());
    buttons
        .button("up")
        .when_pressed(controller.raise_callback());
    buttons
        .button("down")
        .when_pressed(controller.lower_callback());
    buttons.spawn_reader().context("starting stdin reader")?;

    let interrupted = register_interrupts().context("registering signal handlers")?;

    // =========================================================================
    // Run until interrupted
    // =========================================================================
    let worker = StatusWorker::new(
        Arc::clone(&controller),
        ConsoleDisplay::new(),
        StdoutSerial,
        ThreadDelay,
        SystemWallClock,
        settings,
    );
    let worker = spawn_status_worker(worker).context("starting status worker")?;
    log::info!(
        "thermostat running, set point {}F; buttons: {:?}",
        settings.initial_set_point,
        buttons.commands()
    );

    wait_for_interrupt(&interrupted, &config.shutdown);
    shared.request_terminate();

    match join_with_grace(worker, &config.shutdown) {
        ShutdownOutcome::Finished(ticks) => {
            log::info!("thermostat stopped after {} ticks", ticks);
        }
        ShutdownOutcome::Panicked => anyhow::bail!("status worker panicked"),
        ShutdownOutcome::TimedOut(_) => {
            log::warn!("status worker did not stop within the grace period");
        }
    }
    Ok(())
}
