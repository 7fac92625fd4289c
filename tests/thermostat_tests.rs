//! End-to-end tests for the thermostat: buttons, status worker, serial line
//! and shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use rs_blinkz::config::ThermostatConfig;
use rs_blinkz::hal::{MockButton, MockDelay, MockDisplay, MockLed, MockSensor, MockSerial};
use rs_blinkz::services::{
    spawn_status_worker, FixedWallClock, SensorBus, SharedControlState, StatusWorker,
    ThermostatController,
};
use rs_blinkz::thermostat::{thermostat_machine, ThermostatLights, ThermostatState};
use rs_blinkz::traits::{ButtonSource, LedLevel};

type Controller = ThermostatController<MockLed, MockLed, MockSensor>;
type Worker =
    StatusWorker<MockLed, MockLed, MockSensor, MockDisplay, MockSerial, MockDelay, FixedWallClock>;

struct Rig {
    controller: Arc<Controller>,
    heat: MockLed,
    cool: MockLed,
    sensor: MockSensor,
    display: MockDisplay,
    serial: MockSerial,
}

fn clock() -> FixedWallClock {
    FixedWallClock(
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap(),
    )
}

// 22.2C reads as 71F; set point 72F
fn rig() -> Rig {
    let heat = MockLed::new();
    let cool = MockLed::new();
    let sensor = MockSensor::new(22.2);
    let machine =
        thermostat_machine(ThermostatLights::new(heat.clone(), cool.clone(), 1000)).unwrap();
    let shared = Arc::new(SharedControlState::new(72, ThermostatState::Off));
    let controller = Arc::new(ThermostatController::new(
        machine,
        SensorBus::new(sensor.clone()),
        shared,
        1,
    ));
    Rig {
        controller,
        heat,
        cool,
        sensor,
        display: MockDisplay::new(),
        serial: MockSerial::new(),
    }
}

fn worker(rig: &Rig, delay: MockDelay, config: &ThermostatConfig) -> Worker {
    StatusWorker::new(
        Arc::clone(&rig.controller),
        rig.display.clone(),
        rig.serial.clone(),
        delay,
        clock(),
        config,
    )
}

fn second_line(display: &MockDisplay) -> String {
    display.last_frame().unwrap()[1].trim_end().to_string()
}

// ============================================================================
// Status worker, one tick at a time
// ============================================================================

#[test]
fn lcd_shows_clock_and_alternates_second_line() {
    let rig = rig();
    let mut worker = worker(&rig, MockDelay::new(), &ThermostatConfig::default());

    for _ in 0..10 {
        worker.tick();
    }

    let frames = rig.display.frames();
    assert_eq!(frames.len(), 10);
    assert!(frames.iter().all(|f| f[0] == "2024-01-15 18:30"));
    for frame in &frames[..5] {
        assert_eq!(frame[1].trim_end(), "Temp:71F");
    }
    for frame in &frames[5..] {
        assert_eq!(frame[1].trim_end(), "Off:72F");
    }
}

#[test]
fn one_serial_record_per_thirty_ticks() {
    let rig = rig();
    let mut worker = worker(&rig, MockDelay::new(), &ThermostatConfig::default());

    for _ in 0..29 {
        worker.tick();
    }
    assert!(rig.serial.lines().is_empty());

    worker.tick();
    assert_eq!(rig.serial.lines(), vec!["off,71,72"]);

    for _ in 0..30 {
        worker.tick();
    }
    assert_eq!(rig.serial.lines().len(), 2);
    assert_eq!(worker.ticks(), 60);
}

#[test]
fn button_presses_show_up_on_next_mode_line() {
    let rig = rig();
    let config = ThermostatConfig::default().with_alternate_every(1);
    let mut worker = worker(&rig, MockDelay::new(), &config);

    let mut mode = MockButton::new();
    let mut up = MockButton::new();
    mode.when_pressed(rig.controller.cycle_callback());
    up.when_pressed(rig.controller.raise_callback());

    worker.tick(); // temperature
    mode.press();
    up.press();
    up.press();
    worker.tick(); // mode and set point

    assert_eq!(second_line(&rig.display), "Heat:74F");
    assert_eq!(rig.heat.level(), LedLevel::Pulsing);
    assert_eq!(rig.cool.level(), LedLevel::Off);
}

#[test]
fn periodic_relight_tracks_temperature_drift() {
    let rig = rig();
    let config = ThermostatConfig::default().with_alternate_every(2);
    let mut worker = worker(&rig, MockDelay::new(), &config);

    rig.controller.cycle().unwrap();
    rig.controller.cycle().unwrap();
    assert_eq!(rig.cool.level(), LedLevel::On);

    // The room warms up with no button press.
    rig.sensor.set_celsius(25.0);
    for _ in 0..4 {
        worker.tick();
    }
    assert_eq!(rig.cool.level(), LedLevel::On, "no relight within a cycle");

    let plan = worker.tick();
    assert!(plan.relight);
    assert_eq!(rig.cool.level(), LedLevel::Pulsing);
}

#[test]
fn sensor_failure_shows_placeholder_and_skips_record() {
    let rig = rig();
    let config = ThermostatConfig::default().with_serial_every(1);
    let mut worker = worker(&rig, MockDelay::new(), &config);

    rig.sensor.set_failing(true);
    let plan = worker.tick();
    assert!(plan.emit_serial);
    assert_eq!(second_line(&rig.display), "Temp:--F");
    assert!(rig.serial.lines().is_empty());

    rig.sensor.set_failing(false);
    worker.tick();
    assert_eq!(second_line(&rig.display), "Temp:71F");
    assert_eq!(rig.serial.lines(), vec!["off,71,72"]);
}

#[test]
fn nan_reading_shows_placeholder_and_skips_record() {
    let rig = rig();
    let config = ThermostatConfig::default().with_serial_every(1);
    let mut worker = worker(&rig, MockDelay::new(), &config);

    rig.sensor.set_celsius(f32::NAN);
    worker.tick();
    assert_eq!(second_line(&rig.display), "Temp:--F");
    assert!(rig.serial.lines().is_empty());

    rig.sensor.set_celsius(22.2);
    worker.tick();
    assert_eq!(rig.serial.lines(), vec!["off,71,72"]);
}

// ============================================================================
// Threaded run
// ============================================================================

#[test]
fn worker_thread_stops_within_a_slice_and_releases_display() {
    let rig = rig();
    let shared = Arc::clone(rig.controller.shared());
    let slices = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&slices);
    // Tick is 1000 ms in 100 ms slices; stop during the 3rd slice of tick 2.
    let delay = MockDelay::new().with_hook(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) + 1 == 13 {
            shared.request_terminate();
        }
    });

    let worker = worker(&rig, delay.clone(), &ThermostatConfig::default());
    let ticks = spawn_status_worker(worker).unwrap().join().unwrap();

    assert_eq!(ticks, 2);
    assert_eq!(slices.load(Ordering::SeqCst), 13);
    assert!(delay.delays().iter().all(|ms| *ms == 100));
    assert_eq!(rig.display.frames().len(), 2);
    assert_eq!(rig.display.release_count(), 1);
}

#[test]
fn presses_from_other_threads_while_worker_runs() {
    let rig = rig();
    let shared = Arc::clone(rig.controller.shared());
    let stopper = Arc::clone(&shared);
    let slices = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&slices);
    let config = ThermostatConfig::default().with_tick_ms(100);
    let delay = MockDelay::new().with_hook(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) + 1 == 200 {
            stopper.request_terminate();
        }
    });

    let handle = spawn_status_worker(worker(&rig, delay, &config)).unwrap();

    let pressers: Vec<_> = (0..3)
        .map(|_| {
            let mut up = MockButton::new();
            up.when_pressed(rig.controller.raise_callback());
            let mut down = MockButton::new();
            down.when_pressed(rig.controller.lower_callback());
            std::thread::spawn(move || {
                for _ in 0..20 {
                    up.press();
                    up.press();
                    down.press();
                }
            })
        })
        .collect();
    for presser in pressers {
        presser.join().unwrap();
    }

    let ticks = handle.join().unwrap();
    assert_eq!(ticks, 200);
    assert_eq!(rig.controller.set_point(), 72 + 3 * 20);
    assert_eq!(rig.display.release_count(), 1);
}

#[test]
fn terminated_before_start_releases_without_ticking() {
    let rig = rig();
    rig.controller.shared().request_terminate();

    let ticks = worker(&rig, MockDelay::new(), &ThermostatConfig::default()).run();

    assert_eq!(ticks, 0);
    assert!(rig.display.frames().is_empty());
    assert_eq!(rig.display.release_count(), 1);
}

#[test]
fn failed_display_release_still_reports_ticks() {
    let rig = rig();
    let shared = Arc::clone(rig.controller.shared());
    let slices = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&slices);
    let delay = MockDelay::new().with_hook(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) + 1 == 30 {
            shared.request_terminate();
        }
    });
    let display = MockDisplay::new().failing_release();
    let lcd = display.clone();
    let worker = StatusWorker::new(
        Arc::clone(&rig.controller),
        display,
        rig.serial.clone(),
        delay,
        clock(),
        &ThermostatConfig::default(),
    );

    assert_eq!(worker.run(), 3);
    assert_eq!(lcd.frames().len(), 3);
    assert_eq!(lcd.release_count(), 1);
}
