//! Board glue shared by the firmware images.

use embassy_futures::select::{Either4, select4};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use embassy_stm32::time::Hertz;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::config::ControllerConfig;
use crate::hardware::embassy_alarm::EmbassyAlarm;
use crate::pulse::{PulseEngine, PulseEvent, TimerRole};
use crate::speed::SharedSpeed;

pub type FirmwareEngine = PulseEngine<Output<'static>, EmbassyAlarm>;

/// Latest speed published by the control loop for the pulse task.
pub type SpeedSignal = Signal<CriticalSectionRawMutex, u32>;

/// HSE 8 MHz through the PLL to 72 MHz, APB1 at 36 MHz.
pub fn rcc_config() -> embassy_stm32::Config {
    let mut config = embassy_stm32::Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll = Some(Pll {
            src: PllSource::HSE,
            prediv: PllPreDiv::DIV1,
            mul: PllMul::MUL9,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV2;
        config.rcc.apb2_pre = APBPrescaler::DIV1;
    }
    config
}

/// Validate `config` and log what the controller will do. A bad
/// configuration halts startup.
pub fn check_config(config: &ControllerConfig) {
    if let Err(err) = config.validate() {
        error!("{}", err);
        defmt::panic!("invalid controller configuration");
    }

    info!(
        "trigger {} -> pulse {} ({}, {})",
        config.pins.trigger, config.pins.pulse_output, config.trigger, config.ramp
    );
    info!(
        "speed {}..={} step {}, start {}",
        config.speed.min, config.speed.max, config.speed.increment, config.initial_speed
    );
    info!(
        "timer {} Hz from {} Hz, off pulse {} ticks",
        config.timer.tick_hz, config.timer.base_clock_hz, config.timer.off_ticks
    );
    for preset in config.presets.iter() {
        info!("preset {} -> {}", preset.pin, preset.speed);
    }
}

/// Build the pulse engine for the configured trigger variant.
pub fn build_engine(output: Output<'static>, config: &ControllerConfig) -> FirmwareEngine {
    use crate::config::TriggerVariant;

    let timer = || defmt::unwrap!(EmbassyAlarm::new(config.timer.base_clock_hz));
    let engine = match config.trigger {
        TriggerVariant::SingleTimer => PulseEngine::single(output, timer(), config),
        TriggerVariant::DualTimer => PulseEngine::dual(output, timer(), timer(), config),
    };
    defmt::unwrap!(engine)
}

async fn wait_on(timer: Option<&mut EmbassyAlarm>) {
    match timer {
        Some(timer) => timer.wait_expiry().await,
        None => core::future::pending().await,
    }
}

/// Serve trigger edges, alarm expiries and speed updates forever.
pub async fn run_pulse(
    mut engine: FirmwareEngine,
    mut trigger: ExtiInput<'static>,
    speed: &'static SharedSpeed,
    updates: &'static SpeedSignal,
) -> ! {
    loop {
        let event = {
            let (off, on) = engine.timers_mut();
            match select4(
                trigger.wait_for_rising_edge(),
                off.wait_expiry(),
                wait_on(on),
                updates.wait(),
            )
            .await
            {
                Either4::First(()) => PulseEvent::Edge,
                Either4::Second(()) => PulseEvent::Expired(TimerRole::Off),
                Either4::Third(()) => PulseEvent::Expired(TimerRole::On),
                Either4::Fourth(level) => PulseEvent::SpeedChanged(level),
            }
        };

        let Ok(phase) = engine.handle(event, speed.load());
        trace!("{} -> {}", event, phase);
    }
}
