use embassy_time::{Duration, Instant, Timer};

use super::traits::AlarmTimer;
use crate::alarm::{AlarmConfig, TimerClock};
use crate::error::ConfigError;

/// [`AlarmTimer`] on top of the embassy time driver.
///
/// The counter is virtual: while running it advances at the configured tick
/// rate from the instant of the last `start`. The expiry is a deadline
/// awaited in [`wait_expiry`](Self::wait_expiry); the time driver's
/// hardware alarm interrupt wakes the waiting task.
pub struct EmbassyAlarm {
    clock: TimerClock,
    config: AlarmConfig,
    /// Counter value at `started`, or the frozen value while paused.
    counter: u64,
    alarm: u64,
    armed: bool,
    status: bool,
    started: Option<Instant>,
}

impl EmbassyAlarm {
    pub fn new(base_clock_hz: u32) -> Result<Self, ConfigError> {
        let clock = TimerClock::new(base_clock_hz, 1)?;
        Ok(Self {
            clock,
            config: AlarmConfig {
                divider: 1,
                initial_count: 0,
                auto_reload: false,
            },
            counter: 0,
            alarm: 0,
            armed: false,
            status: false,
            started: None,
        })
    }

    fn elapsed_ticks(&self, since: Instant) -> u64 {
        self.clock.micros_to_ticks(since.elapsed().as_micros())
    }

    fn deadline(&self) -> Option<Instant> {
        let started = self.started?;
        if !self.armed {
            return None;
        }
        let remaining = self.alarm.saturating_sub(self.counter);
        Some(started + Duration::from_micros(self.clock.ticks_to_micros(remaining)))
    }

    /// Resolves when the alarm fires, or at once while an earlier expiry is
    /// left uncleared. Never resolves while paused or disarmed.
    ///
    /// Cancel-safe: dropping the future before it resolves changes nothing.
    pub async fn wait_expiry(&mut self) {
        if self.status {
            return;
        }

        let Some(deadline) = self.deadline() else {
            return core::future::pending().await;
        };
        // Retargeted below the current count: expire now and reload from here.
        let deadline = deadline.max(Instant::now());
        Timer::at(deadline).await;

        self.status = true;
        self.started = Some(deadline);
        if self.config.auto_reload {
            self.counter = self.config.initial_count;
        } else {
            self.counter = self.alarm;
            self.armed = false;
        }
    }
}

impl AlarmTimer for EmbassyAlarm {
    fn configure(&mut self, config: AlarmConfig) -> Result<(), ConfigError> {
        self.clock = TimerClock::new(self.clock.base_clock_hz(), config.divider)?;
        self.config = config;
        self.counter = config.initial_count;
        self.armed = false;
        self.status = false;
        self.started = None;
        Ok(())
    }

    fn set_alarm(&mut self, ticks: u32) {
        self.alarm = ticks.max(1) as u64;
        self.armed = true;
    }

    fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.counter += self.elapsed_ticks(started);
        }
    }

    fn clear_interrupt(&mut self) {
        self.status = false;
    }

    fn interrupt_pending(&self) -> bool {
        self.status
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }
}
