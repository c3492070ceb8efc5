//! Speed control loop: preset selection and triangle ramp.

use heapless::Vec;

use crate::config::{ControllerConfig, PinId, RampMode, SpeedBounds};
use crate::display::DisplayBuffer;
use crate::error::ConfigError;
use crate::hardware::traits::SelectorInput;
use crate::speed::SharedSpeed;

/// Capacity of a [`PresetTable`].
pub const MAX_PRESETS: usize = 8;

/// Which active preset wins when several pins are active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PresetPolicy {
    /// Scan the whole table; the last active entry wins.
    LastMatch,
    /// Stop at the first active entry.
    FirstMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub pin: PinId,
    pub speed: u32,
}

/// Ordered `(pin, speed)` pairs. Table order is scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetTable {
    entries: Vec<Preset, MAX_PRESETS>,
    policy: PresetPolicy,
}

impl PresetTable {
    pub const fn new(policy: PresetPolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    /// Table holding exactly `entries`, in order.
    pub fn from_array<const N: usize>(policy: PresetPolicy, entries: [Preset; N]) -> Self {
        const { assert!(N <= MAX_PRESETS) };
        Self {
            entries: entries.into_iter().collect(),
            policy,
        }
    }

    pub fn push(&mut self, pin: PinId, speed: u32) -> Result<(), ConfigError> {
        self.entries
            .push(Preset { pin, speed })
            .map_err(|_| ConfigError::TooManyPresets)
    }

    pub fn policy(&self) -> PresetPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.entries.iter()
    }

    /// Checks that `inputs` selector pins line up one to one with the table.
    pub fn check_inputs(&self, inputs: usize) -> Result<(), ConfigError> {
        if inputs != self.entries.len() {
            return Err(ConfigError::PresetInputMismatch {
                presets: self.entries.len(),
                inputs,
            });
        }
        Ok(())
    }

    /// Speed of the winning active entry. `inputs` are read in table order,
    /// one per entry. `None` when no pin is active.
    pub fn select<I: SelectorInput>(&self, inputs: &[I]) -> Option<u32> {
        let mut active = self
            .entries
            .iter()
            .zip(inputs)
            .filter(|(_, input)| input.is_active())
            .map(|(preset, _)| preset.speed);

        match self.policy {
            PresetPolicy::LastMatch => active.last(),
            PresetPolicy::FirstMatch => active.next(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Up,
    Down,
}

/// Walks between `min` and `max` by `increment`, turning at each bound.
#[derive(Debug, Clone)]
pub struct TriangleRamp {
    bounds: SpeedBounds,
    level: u32,
    direction: Direction,
}

impl TriangleRamp {
    pub fn new(bounds: SpeedBounds, start: u32) -> Self {
        let level = bounds.clamp(start);
        let direction = if level >= bounds.max {
            Direction::Down
        } else {
            Direction::Up
        };
        Self {
            bounds,
            level,
            direction,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn step(&mut self) -> u32 {
        let SpeedBounds {
            min,
            max,
            increment,
        } = self.bounds;

        self.level = match self.direction {
            Direction::Up => self.level.saturating_add(increment).min(max),
            Direction::Down => self.level.saturating_sub(increment).max(min),
        };

        if self.level >= max {
            self.direction = Direction::Down;
        } else if self.level <= min {
            self.direction = Direction::Up;
        }
        self.level
    }
}

/// Outcome of one control-loop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RampStep {
    pub level: u32,
    /// `level / increment`.
    pub index: u32,
    pub display: DisplayBuffer,
}

pub struct SpeedRamp<'a> {
    config: &'a ControllerConfig,
    speed: &'a SharedSpeed,
    level: u32,
    triangle: TriangleRamp,
}

impl<'a> SpeedRamp<'a> {
    /// Publishes the configured initial speed.
    pub fn new(config: &'a ControllerConfig, speed: &'a SharedSpeed) -> Self {
        let level = config.speed.clamp(config.initial_speed);
        speed.store(level);
        Self {
            config,
            speed,
            level,
            triangle: TriangleRamp::new(config.speed, level),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Run one cycle and publish the resulting speed. `inputs` are the
    /// preset pins in table order; triangle mode ignores them.
    pub fn cycle<I: SelectorInput>(&mut self, inputs: &[I]) -> RampStep {
        let increment = self.config.speed.increment;

        self.level = match self.config.ramp {
            RampMode::PresetSelect => self.config.presets.select(inputs).unwrap_or(self.level),
            RampMode::Triangle => self.triangle.step(),
        };
        self.speed.store(self.level);

        let index = self.level.checked_div(increment).unwrap_or(0);
        let display = match DisplayBuffer::for_level(self.level, increment) {
            Ok(display) => display,
            Err(err) => {
                warn!("clamping display: {}", err);
                DisplayBuffer::clamped(self.level, increment)
            }
        };

        info!("Current speed: {}", index);

        RampStep {
            level: self.level,
            index,
            display,
        }
    }
}
