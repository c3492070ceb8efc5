//! Timer clock arithmetic and the tick-driven alarm model.

use crate::error::ConfigError;
use crate::hardware::traits::AlarmTimer;

/// Largest prescaler a 16-bit timer accepts (`PSC + 1`).
pub const MAX_DIVIDER: u32 = 65_536;

/// Timer input clock and the divider in front of the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerClock {
    base_clock_hz: u32,
    divider: u32,
}

impl TimerClock {
    pub fn new(base_clock_hz: u32, divider: u32) -> Result<Self, ConfigError> {
        if base_clock_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        if divider == 0 || divider > MAX_DIVIDER {
            return Err(ConfigError::DividerOutOfRange { divider });
        }
        Ok(Self {
            base_clock_hz,
            divider,
        })
    }

    /// Divider that makes the counter tick at `tick_hz`:
    /// `base_clock_hz / tick_hz`.
    pub fn for_frequency(base_clock_hz: u32, tick_hz: u32) -> Result<Self, ConfigError> {
        if base_clock_hz == 0 || tick_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        Self::new(base_clock_hz, base_clock_hz / tick_hz)
    }

    pub fn base_clock_hz(&self) -> u32 {
        self.base_clock_hz
    }

    pub fn divider(&self) -> u32 {
        self.divider
    }

    pub fn tick_hz(&self) -> u32 {
        self.base_clock_hz / self.divider
    }

    /// Wall time of `ticks` counter ticks, rounded down.
    pub fn ticks_to_micros(&self, ticks: u64) -> u64 {
        let cycles = ticks as u128 * self.divider as u128 * 1_000_000;
        (cycles / self.base_clock_hz as u128) as u64
    }

    /// Whole ticks elapsed in `micros`.
    pub fn micros_to_ticks(&self, micros: u64) -> u64 {
        let cycles = micros as u128 * self.base_clock_hz as u128;
        (cycles / (self.divider as u128 * 1_000_000)) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    pub divider: u32,
    pub initial_count: u64,
    pub auto_reload: bool,
}

/// Counter model of a hardware alarm timer, advanced one tick at a time.
///
/// Behaves like the peripheral: the counter only moves while running,
/// expiry raises a status flag that must be cleared, and a `start` on a
/// running timer does not restart the count.
#[derive(Debug, Clone)]
pub struct TickAlarm {
    config: AlarmConfig,
    counter: u64,
    alarm: u64,
    armed: bool,
    running: bool,
    status: bool,
}

impl TickAlarm {
    pub const fn new() -> Self {
        Self {
            config: AlarmConfig {
                divider: 1,
                initial_count: 0,
                auto_reload: false,
            },
            counter: 0,
            alarm: 0,
            armed: false,
            running: false,
            status: false,
        }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Advance one tick. Returns whether the interrupt line is asserted
    /// afterwards, which includes a status left uncleared by an earlier
    /// expiry.
    pub fn tick(&mut self) -> bool {
        if self.running {
            self.counter += 1;
            if self.armed && self.counter >= self.alarm {
                self.status = true;
                if self.config.auto_reload {
                    self.counter = self.config.initial_count;
                } else {
                    self.armed = false;
                }
            }
        }
        self.status
    }
}

impl Default for TickAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmTimer for TickAlarm {
    fn configure(&mut self, config: AlarmConfig) -> Result<(), ConfigError> {
        if config.divider == 0 || config.divider > MAX_DIVIDER {
            return Err(ConfigError::DividerOutOfRange {
                divider: config.divider,
            });
        }
        self.config = config;
        self.counter = config.initial_count;
        self.armed = false;
        self.running = false;
        self.status = false;
        Ok(())
    }

    fn set_alarm(&mut self, ticks: u32) {
        self.alarm = ticks.max(1) as u64;
        self.armed = true;
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn pause(&mut self) {
        self.running = false;
    }

    fn clear_interrupt(&mut self) {
        self.status = false;
    }

    fn interrupt_pending(&self) -> bool {
        self.status
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
