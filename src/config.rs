//! Controller configuration: pin roles, speed bounds, presets and timing.
//!
//! Built once at startup, validated, then shared read-only with every task.

use core::fmt;

use heapless::Vec;

use crate::alarm::{AlarmConfig, TimerClock};
use crate::error::ConfigError;
use crate::ramp::{MAX_PRESETS, Preset, PresetPolicy, PresetTable};

/// Number of cells on the bar graph.
pub const DISPLAY_CELLS: usize = 8;

/// Trigger, pulse output, three display lines and a full preset table.
const ROLE_PINS: usize = 5 + MAX_PRESETS;

/// STM32 APB2 timer clock with the 72 MHz PLL setup used by the firmware.
pub const TIMER_BASE_CLOCK_HZ: u32 = 72_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
}

/// Board pin, e.g. `PB12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinId {
    pub port: Port,
    pub number: u8,
}

impl PinId {
    pub const fn new(port: Port, number: u8) -> Self {
        Self { port, number }
    }

    fn port_char(&self) -> char {
        match self.port {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
        }
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port_char(), self.number)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PinId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "P{}{}", self.port_char(), self.number)
    }
}

/// Data, strobe and latch lines of the bar-graph shift register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPins {
    pub data: PinId,
    pub strobe: PinId,
    pub latch: PinId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// Rising-edge trigger input.
    pub trigger: PinId,
    pub pulse_output: PinId,
    pub display: Option<DisplayPins>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedBounds {
    pub min: u32,
    pub max: u32,
    pub increment: u32,
}

impl SpeedBounds {
    pub fn contains(&self, level: u32) -> bool {
        (self.min..=self.max).contains(&level)
    }

    pub fn clamp(&self, level: u32) -> u32 {
        level.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerSettings {
    pub base_clock_hz: u32,
    /// Logical counter frequency; the divider is derived from it.
    pub tick_hz: u32,
    /// Pulse width of the dual-timer off timer.
    pub off_ticks: u32,
    pub auto_reload: bool,
}

impl TimerSettings {
    pub fn clock(&self) -> Result<TimerClock, ConfigError> {
        TimerClock::for_frequency(self.base_clock_hz, self.tick_hz)
    }

    pub fn alarm_config(&self) -> Result<AlarmConfig, ConfigError> {
        Ok(AlarmConfig {
            divider: self.clock()?.divider(),
            initial_count: 0,
            auto_reload: self.auto_reload,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampMode {
    /// Speed follows the active preset pin.
    PresetSelect,
    /// Speed walks between the bounds and back.
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerVariant {
    /// Edge raises the output, one timer drops it after `speed` ticks.
    SingleTimer,
    /// Edge starts an immediate or delayed pulse depending on speed.
    DualTimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopTiming {
    pub cycle_ms: u64,
    pub strobe_on_us: u32,
    pub strobe_off_us: u32,
    pub latch_us: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub pins: PinMap,
    pub speed: SpeedBounds,
    pub initial_speed: u32,
    pub presets: PresetTable,
    pub timer: TimerSettings,
    pub ramp: RampMode,
    pub trigger: TriggerVariant,
    pub timing: LoopTiming,
}

impl ControllerConfig {
    /// Single timer, speed picked from five preset pins every 5 s.
    pub fn single_timer() -> Self {
        const BASE_SPEED: u32 = 320;

        let preset = |number: u8, steps: u32| Preset {
            pin: PinId::new(Port::B, number),
            speed: steps * BASE_SPEED,
        };
        let presets = PresetTable::from_array(
            PresetPolicy::LastMatch,
            [
                preset(11, 0),
                preset(12, 1),
                preset(13, 2),
                preset(14, 3),
                preset(15, 4),
            ],
        );

        Self {
            pins: PinMap {
                trigger: PinId::new(Port::B, 1),
                pulse_output: PinId::new(Port::A, 1),
                display: None,
            },
            speed: SpeedBounds {
                min: 0,
                max: 4 * BASE_SPEED,
                increment: BASE_SPEED,
            },
            initial_speed: BASE_SPEED,
            presets,
            timer: TimerSettings {
                base_clock_hz: TIMER_BASE_CLOCK_HZ,
                tick_hz: 1600,
                off_ticks: 16,
                auto_reload: true,
            },
            ramp: RampMode::PresetSelect,
            trigger: TriggerVariant::SingleTimer,
            timing: LoopTiming {
                cycle_ms: 5000,
                strobe_on_us: 1000,
                strobe_off_us: 1000,
                latch_us: 1000,
            },
        }
    }

    /// Two timers, triangle ramp over the full display range.
    pub fn dual_timer() -> Self {
        const INCREMENT: u32 = 320;

        Self {
            pins: PinMap {
                trigger: PinId::new(Port::B, 1),
                pulse_output: PinId::new(Port::A, 1),
                display: Some(DisplayPins {
                    data: PinId::new(Port::A, 5),
                    strobe: PinId::new(Port::A, 6),
                    latch: PinId::new(Port::A, 7),
                }),
            },
            speed: SpeedBounds {
                min: 0,
                max: (DISPLAY_CELLS as u32 - 1) * INCREMENT,
                increment: INCREMENT,
            },
            initial_speed: 0,
            presets: PresetTable::new(PresetPolicy::LastMatch),
            timer: TimerSettings {
                base_clock_hz: TIMER_BASE_CLOCK_HZ,
                tick_hz: 1600,
                off_ticks: 16,
                auto_reload: true,
            },
            ramp: RampMode::Triangle,
            trigger: TriggerVariant::DualTimer,
            timing: LoopTiming {
                cycle_ms: 1000,
                strobe_on_us: 1000,
                strobe_off_us: 1000,
                latch_us: 1000,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let SpeedBounds {
            min,
            max,
            increment,
        } = self.speed;

        if min > max {
            return Err(ConfigError::InvertedBounds { min, max });
        }
        if increment == 0 {
            return Err(ConfigError::ZeroIncrement);
        }
        for bound in [min, max] {
            if bound % increment != 0 {
                return Err(ConfigError::MisalignedBound { bound, increment });
            }
        }
        let max_index = max / increment;
        if max_index >= DISPLAY_CELLS as u32 {
            return Err(ConfigError::DisplayOverflow { max_index });
        }

        self.timer.clock()?;

        if !self.speed.contains(self.initial_speed) {
            return Err(ConfigError::SpeedOutOfBounds {
                speed: self.initial_speed,
            });
        }
        if let Some(preset) = self.presets.iter().find(|p| !self.speed.contains(p.speed)) {
            return Err(ConfigError::SpeedOutOfBounds {
                speed: preset.speed,
            });
        }

        self.check_pins()
    }

    fn check_pins(&self) -> Result<(), ConfigError> {
        let mut used: Vec<PinId, ROLE_PINS> = Vec::new();
        let display = self
            .pins
            .display
            .iter()
            .flat_map(|d| [d.data, d.strobe, d.latch]);
        let all = [self.pins.trigger, self.pins.pulse_output]
            .into_iter()
            .chain(display)
            .chain(self.presets.iter().map(|p| p.pin));

        for pin in all {
            if used.contains(&pin) {
                return Err(ConfigError::PinConflict);
            }
            used.push(pin).map_err(|_| ConfigError::PinConflict)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_configs_are_valid() {
        assert_eq!(ControllerConfig::single_timer().validate(), Ok(()));
        assert_eq!(ControllerConfig::dual_timer().validate(), Ok(()));
    }

    #[test]
    fn single_timer_presets_step_by_base_speed() {
        let config = ControllerConfig::single_timer();
        let speeds: std::vec::Vec<u32> = config.presets.iter().map(|p| p.speed).collect();
        assert_eq!(speeds, [0, 320, 640, 960, 1280]);
        assert_eq!(config.presets.iter().next().unwrap().pin.to_string(), "PB11");
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut config = ControllerConfig::dual_timer();
        config.speed.min = 640;
        config.speed.max = 320;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedBounds { min: 640, max: 320 })
        );
    }

    #[test]
    fn rejects_zero_increment() {
        let mut config = ControllerConfig::dual_timer();
        config.speed.increment = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroIncrement));
    }

    #[test]
    fn rejects_misaligned_bound() {
        let mut config = ControllerConfig::dual_timer();
        config.speed.max = 2000;
        assert_eq!(
            config.validate(),
            Err(ConfigError::MisalignedBound {
                bound: 2000,
                increment: 320
            })
        );
    }

    #[test]
    fn rejects_bounds_past_the_display() {
        let mut config = ControllerConfig::dual_timer();
        config.speed.max = 8 * 320;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DisplayOverflow { max_index: 8 })
        );
    }

    #[test]
    fn rejects_unreachable_tick_rate() {
        let mut config = ControllerConfig::dual_timer();
        config.timer.tick_hz = 100;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DividerOutOfRange { divider: 720_000 })
        );
    }

    #[test]
    fn rejects_preset_outside_bounds() {
        let mut config = ControllerConfig::single_timer();
        config.speed.max = 960;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SpeedOutOfBounds { speed: 1280 })
        );
    }

    #[test]
    fn rejects_shared_pin() {
        let mut config = ControllerConfig::single_timer();
        config.pins.pulse_output = PinId::new(Port::B, 13);
        assert_eq!(config.validate(), Err(ConfigError::PinConflict));
    }

    #[test]
    fn full_preset_table_fits_the_pin_check() {
        let mut config = ControllerConfig::dual_timer();
        for number in 8..8 + MAX_PRESETS as u8 {
            config
                .presets
                .push(PinId::new(Port::B, number), 320)
                .unwrap();
        }
        assert_eq!(config.validate(), Ok(()));

        let mut config = ControllerConfig::dual_timer();
        for number in 8..7 + MAX_PRESETS as u8 {
            config
                .presets
                .push(PinId::new(Port::B, number), 320)
                .unwrap();
        }
        config.presets.push(PinId::new(Port::A, 7), 320).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::PinConflict));
    }

    #[test]
    fn alarm_config_uses_derived_divider() {
        let config = ControllerConfig::dual_timer();
        let alarm = config.timer.alarm_config().unwrap();
        assert_eq!(alarm.divider, 45_000);
        assert!(alarm.auto_reload);
        assert_eq!(alarm.initial_count, 0);
    }
}
