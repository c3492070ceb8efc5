use crate::alarm::AlarmConfig;
use crate::error::ConfigError;

/// One countdown timer with a single alarm.
///
/// The counter counts up from `initial_count` while running. When it reaches
/// the alarm value the interrupt status is raised; with auto-reload the
/// counter goes back to `initial_count`, otherwise the alarm is disabled.
/// The status stays raised until [`clear_interrupt`](Self::clear_interrupt)
/// and re-fires while it is left set.
pub trait AlarmTimer {
    /// Stop the timer, load the initial count, disarm and clear status.
    fn configure(&mut self, config: AlarmConfig) -> Result<(), ConfigError>;

    /// Set the alarm threshold in ticks and enable the alarm. The counter
    /// is left alone, so a running count is retargeted.
    fn set_alarm(&mut self, ticks: u32);

    /// Start counting. No-op while already running.
    fn start(&mut self);

    /// Stop counting; the counter keeps its value.
    fn pause(&mut self);

    fn clear_interrupt(&mut self);

    fn interrupt_pending(&self) -> bool;

    fn is_running(&self) -> bool;
}

/// Active-low selector input.
pub trait SelectorInput {
    fn is_active(&self) -> bool;
}
