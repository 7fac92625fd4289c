//! Threaded thermostat controller.
//!
//! Button callbacks and the status worker both touch the automaton and the
//! sensor, so both live behind locks:
//!
//! - the automaton (and the indicator LEDs it owns) behind one `Mutex`, so
//!   `fire` is never called concurrently;
//! - the sensor behind [`SensorBus`], the single global lock for the bus.
//!
//! Lock order is always automaton, then set point, then sensor. The set point
//! lock is released before the sensor is read.

use std::sync::{Arc, Mutex};

use crate::error::ControlError;
use crate::fsm::MachineState;
use crate::thermostat::{
    celsius_to_fahrenheit, plan_lights, LightPlan, StatusRecord, ThermostatEvent,
    ThermostatMachine, ThermostatState,
};
use crate::traits::{DigitalOutput, PressCallback, TemperatureSensor};

use super::shared::{lock_recovering, SharedControlState};

/// Shared state of the thermostat: the set point and the current mode.
pub type ThermostatShared = SharedControlState<i32, ThermostatState>;

/// Temperature sensor behind the global bus lock.
pub struct SensorBus<T> {
    sensor: Mutex<T>,
}

impl<T: TemperatureSensor> SensorBus<T> {
    /// Wraps `sensor`.
    pub fn new(sensor: T) -> Self {
        Self {
            sensor: Mutex::new(sensor),
        }
    }

    /// Reads Celsius while holding the bus lock.
    ///
    /// NaN and infinite readings are rejected as sensor failures.
    pub fn read_celsius(&self) -> Result<f32, ControlError> {
        let mut sensor = lock_recovering(&self.sensor);
        let celsius = sensor
            .read_celsius()
            .map_err(|e| ControlError::SensorRead(format!("{:?}", e)))?;
        if !celsius.is_finite() {
            return Err(ControlError::SensorRead(format!(
                "non-finite reading {}",
                celsius
            )));
        }
        Ok(celsius)
    }

    /// Reads whole degrees Fahrenheit, rounded down.
    pub fn read_fahrenheit(&self) -> Result<i32, ControlError> {
        self.read_celsius().map(celsius_to_fahrenheit)
    }
}

/// The thermostat's mode, set point and indicators, safe to share between
/// button callbacks and the status worker.
pub struct ThermostatController<H, C, T> {
    machine: Mutex<ThermostatMachine<H, C>>,
    sensor: SensorBus<T>,
    shared: Arc<ThermostatShared>,
    step: i32,
}

impl<H, C, T> ThermostatController<H, C, T>
where
    H: DigitalOutput,
    C: DigitalOutput,
    T: TemperatureSensor,
{
    /// Creates the controller. The shared state's mode is synced to the
    /// automaton. Steps below 1 are clamped to 1.
    pub fn new(
        machine: ThermostatMachine<H, C>,
        sensor: SensorBus<T>,
        shared: Arc<ThermostatShared>,
        set_point_step: i32,
    ) -> Self {
        shared.set_current_state(machine.current());
        Self {
            machine: Mutex::new(machine),
            sensor,
            shared,
            step: set_point_step.max(1),
        }
    }

    /// The shared state.
    pub fn shared(&self) -> &Arc<ThermostatShared> {
        &self.shared
    }

    /// Current mode.
    pub fn mode(&self) -> ThermostatState {
        lock_recovering(&self.machine).current()
    }

    /// Current set point, °F.
    pub fn set_point(&self) -> i32 {
        self.shared.value()
    }

    /// Current temperature, °F.
    pub fn temperature_f(&self) -> Result<i32, ControlError> {
        self.sensor.read_fahrenheit()
    }

    /// Re-evaluates the indicators against the sensor and set point.
    ///
    /// Idempotent. On a sensor failure the indicators are left as they are.
    pub fn update_lights(&self) -> Result<LightPlan, ControlError> {
        let mut machine = lock_recovering(&self.machine);
        self.relight(&mut machine)
    }

    /// Advances to the next mode and re-evaluates the indicators.
    pub fn cycle(&self) -> Result<ThermostatState, ControlError> {
        let mut machine = lock_recovering(&self.machine);
        machine.fire(ThermostatEvent::Cycle)?;
        let mode = machine.current();
        self.shared.set_current_state(mode);
        log::info!("mode: {}", mode.name());

        self.relight(&mut machine)?;
        Ok(mode)
    }

    /// Raises the set point by one step and re-evaluates the indicators.
    pub fn raise_set_point(&self) -> Result<i32, ControlError> {
        self.adjust_set_point(self.step)
    }

    /// Lowers the set point by one step and re-evaluates the indicators.
    pub fn lower_set_point(&self) -> Result<i32, ControlError> {
        self.adjust_set_point(-self.step)
    }

    fn adjust_set_point(&self, delta: i32) -> Result<i32, ControlError> {
        let mut machine = lock_recovering(&self.machine);
        let set_point = self.shared.with_value(|sp| {
            *sp = sp.saturating_add(delta);
            *sp
        });
        log::info!("set point: {}F", set_point);

        self.relight(&mut machine)?;
        Ok(set_point)
    }

    /// Snapshot for the serial line.
    pub fn status_record(&self) -> Result<StatusRecord, ControlError> {
        let mode = self.mode();
        let set_point = self.set_point();
        let temperature_f = self.temperature_f()?;
        Ok(StatusRecord {
            mode,
            temperature_f,
            set_point,
        })
    }

    fn relight(&self, machine: &mut ThermostatMachine<H, C>) -> Result<LightPlan, ControlError> {
        let mode = machine.current();
        let set_point = self.shared.value();
        let temperature_f = self.sensor.read_fahrenheit()?;

        let plan = plan_lights(mode, temperature_f, set_point);
        log::debug!(
            "{} at {}F (set {}F): heat {}, cool {}",
            mode.name(),
            temperature_f,
            set_point,
            plan.heat.as_str(),
            plan.cool.as_str()
        );
        machine.context_mut().apply(plan)?;
        Ok(plan)
    }
}

impl<H, C, T> ThermostatController<H, C, T>
where
    H: DigitalOutput + Send + 'static,
    C: DigitalOutput + Send + 'static,
    T: TemperatureSensor + Send + 'static,
{
    /// Button callback for [`cycle`](Self::cycle).
    pub fn cycle_callback(self: &Arc<Self>) -> PressCallback {
        let controller = Arc::clone(self);
        Box::new(move || {
            if let Err(e) = controller.cycle() {
                log::warn!("cycle: {}", e);
            }
        })
    }

    /// Button callback for [`raise_set_point`](Self::raise_set_point).
    pub fn raise_callback(self: &Arc<Self>) -> PressCallback {
        let controller = Arc::clone(self);
        Box::new(move || {
            if let Err(e) = controller.raise_set_point() {
                log::warn!("raise set point: {}", e);
            }
        })
    }

    /// Button callback for [`lower_set_point`](Self::lower_set_point).
    pub fn lower_callback(self: &Arc<Self>) -> PressCallback {
        let controller = Arc::clone(self);
        Box::new(move || {
            if let Err(e) = controller.lower_set_point() {
                log::warn!("lower set point: {}", e);
            }
        })
    }
}
