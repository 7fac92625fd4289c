//! Thermostat automaton and indicator planning.
//!
//! Three modes in a ring, advanced by a single [`ThermostatEvent::Cycle`]:
//!
//! ```text
//! off ──cycle──► heat ──cycle──► cool ──cycle──► off
//! ```
//!
//! Unlike the beacon, entering a mode does not hold anything. The indicator
//! levels are a pure function of mode, temperature and set point
//! ([`plan_lights`]) and are re-applied whenever any of the three changes.
//! Exit actions switch off the indicator of the mode being left so a stale
//! pulse never survives a mode change.

use core::fmt;

use crate::error::{BuildError, ControlError};
use crate::fsm::{MachineBuilder, MachineEvent, MachineState, StateMachine};
use crate::traits::{DigitalOutput, LedLevel};

/// Thermostat modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ThermostatState {
    /// Neither heating nor cooling.
    #[default]
    Off,
    /// Heating toward the set point.
    Heat,
    /// Cooling toward the set point.
    Cool,
}

impl ThermostatState {
    /// All modes in ring order.
    pub const RING: [ThermostatState; 3] = [
        ThermostatState::Off,
        ThermostatState::Heat,
        ThermostatState::Cool,
    ];

    /// Mode reached by one [`ThermostatEvent::Cycle`].
    pub const fn next(self) -> Self {
        match self {
            ThermostatState::Off => ThermostatState::Heat,
            ThermostatState::Heat => ThermostatState::Cool,
            ThermostatState::Cool => ThermostatState::Off,
        }
    }

    /// Title-cased name for the LCD.
    pub const fn title(&self) -> &'static str {
        match self {
            ThermostatState::Off => "Off",
            ThermostatState::Heat => "Heat",
            ThermostatState::Cool => "Cool",
        }
    }
}

impl MachineState for ThermostatState {
    fn name(&self) -> &'static str {
        match self {
            ThermostatState::Off => "off",
            ThermostatState::Heat => "heat",
            ThermostatState::Cool => "cool",
        }
    }
}

/// Thermostat events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ThermostatEvent {
    /// Advance to the next mode in the ring.
    Cycle,
}

impl MachineEvent for ThermostatEvent {
    fn name(&self) -> &'static str {
        "cycle"
    }
}

/// Heat and cool indicator LEDs.
pub struct ThermostatLights<H, C> {
    /// Red indicator, active in `heat`.
    pub heat_led: H,
    /// Blue indicator, active in `cool`.
    pub cool_led: C,
    /// Fade in/out time used when pulsing.
    pub fade_ms: u32,
}

impl<H: DigitalOutput, C: DigitalOutput> ThermostatLights<H, C> {
    /// Bundles the indicators.
    pub fn new(heat_led: H, cool_led: C, fade_ms: u32) -> Self {
        Self {
            heat_led,
            cool_led,
            fade_ms,
        }
    }

    /// Drives both indicators to `plan`.
    ///
    /// Both are attempted even if the first fails; the first failure is
    /// returned.
    pub fn apply(&mut self, plan: LightPlan) -> Result<(), ControlError> {
        let heat = self
            .heat_led
            .set_level(plan.heat, self.fade_ms)
            .map_err(|e| ControlError::Output(alloc::format!("heat LED: {:?}", e)));
        let cool = self
            .cool_led
            .set_level(plan.cool, self.fade_ms)
            .map_err(|e| ControlError::Output(alloc::format!("cool LED: {:?}", e)));
        heat.and(cool)
    }
}

/// The thermostat automaton.
pub type ThermostatMachine<H, C> =
    StateMachine<ThermostatState, ThermostatEvent, ThermostatLights<H, C>>;

/// Builds the thermostat automaton around `lights`, starting in `off`.
pub fn thermostat_machine<H, C>(
    lights: ThermostatLights<H, C>,
) -> Result<ThermostatMachine<H, C>, BuildError>
where
    H: DigitalOutput,
    C: DigitalOutput,
{
    let mut builder = MachineBuilder::new(ThermostatState::Off);
    for state in ThermostatState::RING {
        builder = builder.transition(state, ThermostatEvent::Cycle, state.next())?;
    }

    builder
        .on_exit(ThermostatState::Heat, exit_heat::<H, C>)
        .on_exit(ThermostatState::Cool, exit_cool::<H, C>)
        .on_enter(ThermostatState::Off, enter_off::<H, C>)
        .build(lights)
}

fn exit_heat<H: DigitalOutput, C: DigitalOutput>(lights: &mut ThermostatLights<H, C>) {
    log::debug!("leaving heat");
    if let Err(e) = lights.heat_led.off() {
        log::warn!("heat LED off failed: {:?}", e);
    }
}

fn exit_cool<H: DigitalOutput, C: DigitalOutput>(lights: &mut ThermostatLights<H, C>) {
    log::debug!("leaving cool");
    if let Err(e) = lights.cool_led.off() {
        log::warn!("cool LED off failed: {:?}", e);
    }
}

fn enter_off<H: DigitalOutput, C: DigitalOutput>(lights: &mut ThermostatLights<H, C>) {
    log::debug!("entering off");
    if let Err(e) = lights.apply(LightPlan::DARK) {
        log::warn!("{}", e);
    }
}

/// Target levels for both indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LightPlan {
    /// Heat indicator level.
    pub heat: LedLevel,
    /// Cool indicator level.
    pub cool: LedLevel,
}

impl LightPlan {
    /// Both indicators off.
    pub const DARK: LightPlan = LightPlan {
        heat: LedLevel::Off,
        cool: LedLevel::Off,
    };
}

/// Indicator levels for `state` at `temperature_f` against `set_point`.
///
/// In `heat` the heat indicator pulses while the room is below the set point
/// and is steady otherwise; `cool` mirrors that with an above comparison. A
/// temperature equal to the set point is steady in both.
///
/// ```
/// use rs_blinkz::thermostat::{plan_lights, ThermostatState};
/// use rs_blinkz::traits::LedLevel;
///
/// let plan = plan_lights(ThermostatState::Heat, 70, 72);
/// assert_eq!(plan.heat, LedLevel::Pulsing);
/// assert_eq!(plan.cool, LedLevel::Off);
///
/// let plan = plan_lights(ThermostatState::Heat, 72, 72);
/// assert_eq!(plan.heat, LedLevel::On);
/// ```
pub const fn plan_lights(state: ThermostatState, temperature_f: i32, set_point: i32) -> LightPlan {
    match state {
        ThermostatState::Off => LightPlan::DARK,
        ThermostatState::Heat => LightPlan {
            heat: if temperature_f < set_point {
                LedLevel::Pulsing
            } else {
                LedLevel::On
            },
            cool: LedLevel::Off,
        },
        ThermostatState::Cool => LightPlan {
            heat: LedLevel::Off,
            cool: if temperature_f > set_point {
                LedLevel::Pulsing
            } else {
                LedLevel::On
            },
        },
    }
}

/// Converts Celsius to whole degrees Fahrenheit, rounding toward negative
/// infinity.
///
/// ```
/// use rs_blinkz::thermostat::celsius_to_fahrenheit;
///
/// assert_eq!(celsius_to_fahrenheit(22.0), 71); // 71.6
/// assert_eq!(celsius_to_fahrenheit(-40.0), -40);
/// assert_eq!(celsius_to_fahrenheit(-18.0), -1); // -0.4
/// ```
pub fn celsius_to_fahrenheit(celsius: f32) -> i32 {
    let fahrenheit = celsius * 9.0 / 5.0 + 32.0;
    let truncated = fahrenheit as i32;
    if (truncated as f32) > fahrenheit {
        truncated - 1
    } else {
        truncated
    }
}

/// One serial status record: `<mode>,<temperatureF>,<setPoint>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusRecord {
    /// Current mode.
    pub mode: ThermostatState,
    /// Temperature in whole °F.
    pub temperature_f: i32,
    /// Set point in whole °F.
    pub set_point: i32,
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.mode.name(),
            self.temperature_f,
            self.set_point
        )
    }
}
