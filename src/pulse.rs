//! Edge-triggered pulse generation.
//!
//! [`PulseEngine`] reacts to trigger edges and alarm expiries by writing the
//! output pin and timer registers only. It never blocks, logs or allocates,
//! so its handlers are safe to run from interrupt context.

use embedded_hal::digital::OutputPin;

use crate::config::{ControllerConfig, TriggerVariant};
use crate::error::ConfigError;
use crate::hardware::traits::AlarmTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulsePhase {
    /// Output low, no alarm pending.
    Idle,
    /// Output high, off timer pending.
    PulseHigh,
    /// Output low, on timer pending a delayed rise.
    PulseLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerRole {
    /// Ends the pulse.
    Off,
    /// Starts a delayed pulse (dual timer only).
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseEvent {
    /// Rising edge on the trigger input.
    Edge,
    Expired(TimerRole),
    /// New commanded speed from the control loop.
    SpeedChanged(u32),
}

pub struct PulseEngine<P, A> {
    output: P,
    off_timer: A,
    on_timer: Option<A>,
    phase: PulsePhase,
    min_speed: u32,
    off_ticks: u32,
}

impl<P, A> PulseEngine<P, A>
where
    P: OutputPin,
    A: AlarmTimer,
{
    /// One timer: an edge raises the output and the timer drops it after
    /// `speed` ticks.
    ///
    /// The output pin must already be driven low.
    pub fn single(output: P, timer: A, config: &ControllerConfig) -> Result<Self, ConfigError> {
        Self::new(output, timer, None, config)
    }

    /// Two timers: at rest speed an edge gives an immediate pulse of
    /// `off_ticks`; above it the pulse starts `speed` ticks later.
    ///
    /// The output pin must already be driven low.
    pub fn dual(
        output: P,
        off_timer: A,
        on_timer: A,
        config: &ControllerConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(output, off_timer, Some(on_timer), config)
    }

    fn new(
        output: P,
        mut off_timer: A,
        mut on_timer: Option<A>,
        config: &ControllerConfig,
    ) -> Result<Self, ConfigError> {
        let alarm = config.timer.alarm_config()?;
        off_timer.configure(alarm)?;
        if let Some(timer) = on_timer.as_mut() {
            timer.configure(alarm)?;
        }

        Ok(Self {
            output,
            off_timer,
            on_timer,
            phase: PulsePhase::Idle,
            min_speed: config.speed.min,
            off_ticks: config.timer.off_ticks,
        })
    }

    pub fn variant(&self) -> TriggerVariant {
        match self.on_timer {
            Some(_) => TriggerVariant::DualTimer,
            None => TriggerVariant::SingleTimer,
        }
    }

    pub fn phase(&self) -> PulsePhase {
        self.phase
    }

    pub fn output(&self) -> &P {
        &self.output
    }

    /// Off timer and, for the dual variant, on timer. Lets the caller wait on
    /// both expiries at once.
    pub fn timers_mut(&mut self) -> (&mut A, Option<&mut A>) {
        (&mut self.off_timer, self.on_timer.as_mut())
    }

    /// Apply one event. `speed` is the current shared speed.
    pub fn handle(&mut self, event: PulseEvent, speed: u32) -> Result<PulsePhase, P::Error> {
        match event {
            PulseEvent::Edge => self.on_edge(speed)?,
            PulseEvent::Expired(role) => self.on_expiry(role)?,
            PulseEvent::SpeedChanged(level) => self.retune(level),
        }
        Ok(self.phase)
    }

    fn on_edge(&mut self, speed: u32) -> Result<(), P::Error> {
        // No debounce: edges while a pulse is pending neither extend nor
        // repeat it.
        if self.phase != PulsePhase::Idle {
            return Ok(());
        }

        match self.on_timer.as_mut() {
            None => {
                self.output.set_high()?;
                self.off_timer.set_alarm(speed);
                self.off_timer.start();
                self.phase = PulsePhase::PulseHigh;
            }
            Some(_) if speed <= self.min_speed => {
                self.output.set_high()?;
                self.off_timer.set_alarm(self.off_ticks);
                self.off_timer.start();
                self.phase = PulsePhase::PulseHigh;
            }
            Some(on_timer) => {
                on_timer.set_alarm(speed);
                on_timer.start();
                self.phase = PulsePhase::PulseLow;
            }
        }
        Ok(())
    }

    fn on_expiry(&mut self, role: TimerRole) -> Result<(), P::Error> {
        let timer = match role {
            TimerRole::Off => &mut self.off_timer,
            TimerRole::On => match self.on_timer.as_mut() {
                Some(timer) => timer,
                None => return Ok(()),
            },
        };
        // Status must be cleared or the line re-fires.
        timer.clear_interrupt();
        timer.pause();

        match (role, self.phase) {
            (TimerRole::Off, PulsePhase::PulseHigh) => {
                self.output.set_low()?;
                self.phase = PulsePhase::Idle;
            }
            (TimerRole::On, PulsePhase::PulseLow) => {
                self.output.set_high()?;
                self.off_timer.set_alarm(self.off_ticks);
                self.off_timer.start();
                self.phase = PulsePhase::PulseHigh;
            }
            // Stale expiry from a retune; nothing pending on this timer.
            _ => {}
        }
        Ok(())
    }

    fn retune(&mut self, level: u32) {
        match self.on_timer.as_mut() {
            None => self.off_timer.set_alarm(level),
            Some(on_timer) => on_timer.set_alarm(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::TickAlarm;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct RecordingPin {
        high: bool,
        writes: Vec<bool>,
    }

    impl RecordingPin {
        fn rises(&self) -> usize {
            self.writes.iter().filter(|&&high| high).count()
        }
    }

    impl ErrorType for RecordingPin {
        type Error = Infallible;
    }

    impl OutputPin for RecordingPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.writes.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.writes.push(true);
            Ok(())
        }
    }

    type Engine = PulseEngine<RecordingPin, TickAlarm>;

    fn single() -> Engine {
        let config = ControllerConfig::single_timer();
        PulseEngine::single(RecordingPin::default(), TickAlarm::new(), &config).unwrap()
    }

    fn dual() -> Engine {
        let config = ControllerConfig::dual_timer();
        PulseEngine::dual(
            RecordingPin::default(),
            TickAlarm::new(),
            TickAlarm::new(),
            &config,
        )
        .unwrap()
    }

    /// Tick both timers and feed expiries back like the interrupt handlers.
    fn advance(engine: &mut Engine, ticks: u32, speed: u32) {
        for _ in 0..ticks {
            let (off, on) = engine.timers_mut();
            let off_fired = off.tick();
            let on_fired = on.is_some_and(|timer| timer.tick());
            if off_fired {
                engine
                    .handle(PulseEvent::Expired(TimerRole::Off), speed)
                    .unwrap();
            }
            if on_fired {
                engine
                    .handle(PulseEvent::Expired(TimerRole::On), speed)
                    .unwrap();
            }
        }
    }

    #[test]
    fn variant_follows_constructor() {
        assert_eq!(single().variant(), TriggerVariant::SingleTimer);
        assert_eq!(dual().variant(), TriggerVariant::DualTimer);
    }

    #[test]
    fn single_pulse_width_is_speed_ticks() {
        let mut engine = single();
        let speed = 320;

        assert_eq!(engine.handle(PulseEvent::Edge, speed), Ok(PulsePhase::PulseHigh));
        assert!(engine.output().high);

        advance(&mut engine, speed - 1, speed);
        assert!(engine.output().high);

        advance(&mut engine, 1, speed);
        assert!(!engine.output().high);
        assert_eq!(engine.phase(), PulsePhase::Idle);

        let (off, _) = engine.timers_mut();
        assert!(!off.is_running());
        assert!(!off.interrupt_pending());
    }

    #[test]
    fn single_edge_during_pulse_does_not_extend_it() {
        let mut engine = single();
        let speed = 640;

        engine.handle(PulseEvent::Edge, speed).unwrap();
        advance(&mut engine, 100, speed);
        assert_eq!(engine.handle(PulseEvent::Edge, speed), Ok(PulsePhase::PulseHigh));
        advance(&mut engine, speed - 101, speed);
        assert!(engine.output().high);
        advance(&mut engine, 1, speed);
        assert!(!engine.output().high);
        assert_eq!(engine.output().rises(), 1);
    }

    #[test]
    fn single_back_to_back_pulses() {
        let mut engine = single();

        for _ in 0..3 {
            engine.handle(PulseEvent::Edge, 10).unwrap();
            advance(&mut engine, 10, 10);
            assert_eq!(engine.phase(), PulsePhase::Idle);
        }
        assert_eq!(engine.output().writes, [true, false, true, false, true, false]);
    }

    #[test]
    fn single_speed_change_retargets_running_pulse() {
        let mut engine = single();

        engine.handle(PulseEvent::Edge, 960).unwrap();
        advance(&mut engine, 100, 960);
        engine.handle(PulseEvent::SpeedChanged(320), 320).unwrap();
        advance(&mut engine, 219, 320);
        assert!(engine.output().high);
        advance(&mut engine, 1, 320);
        assert!(!engine.output().high);
    }

    #[test]
    fn dual_at_rest_pulses_immediately_for_off_ticks() {
        let mut engine = dual();
        let off_ticks = ControllerConfig::dual_timer().timer.off_ticks;

        assert_eq!(engine.handle(PulseEvent::Edge, 0), Ok(PulsePhase::PulseHigh));
        assert!(engine.output().high);

        // Repeated edges while the off timer is pending are ignored.
        for _ in 0..5 {
            engine.handle(PulseEvent::Edge, 0).unwrap();
        }
        advance(&mut engine, off_ticks - 1, 0);
        assert!(engine.output().high);
        advance(&mut engine, 1, 0);
        assert!(!engine.output().high);
        assert_eq!(engine.phase(), PulsePhase::Idle);
        assert_eq!(engine.output().writes, [true, false]);
    }

    #[test]
    fn dual_above_rest_delays_the_pulse() {
        let mut engine = dual();
        let off_ticks = ControllerConfig::dual_timer().timer.off_ticks;
        let speed = 640;

        assert_eq!(engine.handle(PulseEvent::Edge, speed), Ok(PulsePhase::PulseLow));
        assert!(!engine.output().high);
        engine.handle(PulseEvent::Edge, speed).unwrap();

        advance(&mut engine, speed - 1, speed);
        assert_eq!(engine.phase(), PulsePhase::PulseLow);
        advance(&mut engine, 1, speed);
        assert_eq!(engine.phase(), PulsePhase::PulseHigh);
        assert!(engine.output().high);

        advance(&mut engine, off_ticks, speed);
        assert_eq!(engine.phase(), PulsePhase::Idle);
        assert_eq!(engine.output().writes, [true, false]);

        let (off, on) = engine.timers_mut();
        assert!(!off.is_running());
        assert!(!on.unwrap().is_running());
    }

    #[test]
    fn dual_speed_change_retargets_on_timer() {
        let mut engine = dual();

        engine.handle(PulseEvent::Edge, 960).unwrap();
        engine.handle(PulseEvent::SpeedChanged(320), 320).unwrap();
        advance(&mut engine, 320, 320);
        assert_eq!(engine.phase(), PulsePhase::PulseHigh);
    }

    #[test]
    fn stale_expiry_is_acknowledged_without_transition() {
        let mut engine = dual();

        let (_, on) = engine.timers_mut();
        let on = on.unwrap();
        on.set_alarm(1);
        on.start();
        assert!(on.tick());

        assert_eq!(
            engine.handle(PulseEvent::Expired(TimerRole::On), 0),
            Ok(PulsePhase::Idle)
        );
        assert!(engine.output().writes.is_empty());
        let (_, on) = engine.timers_mut();
        let on = on.unwrap();
        assert!(!on.interrupt_pending());
        assert!(!on.is_running());
    }

    #[test]
    fn rejects_unreachable_timer_rate() {
        let mut config = ControllerConfig::single_timer();
        config.timer.tick_hz = 0;
        let result = PulseEngine::single(RecordingPin::default(), TickAlarm::new(), &config);
        assert!(matches!(result, Err(ConfigError::ZeroFrequency)));
    }
}
