//! STM32 Blue Pill Edge-Triggered Pulse with Preset Speeds
//! =============================================================================================
//!
//! Date			Author          Notes
//! 2026-10-18	    speed_pulse     Initial release
//!
//!==============================================================================================
//!
//! A rising edge on the trigger pin raises the pulse output; a countdown
//! alarm drops it again after `speed` timer ticks (1600 Hz). Every 5 s the
//! control loop scans five active-low preset pins and, when one is pulled
//! to ground, takes its speed. With several pins grounded the last one in
//! scan order wins.
//!
//! Hardware Connections:
//!   Trigger input   -> PB1 (pull-up, rising edge)
//!   Pulse output    -> PA1
//!   Preset pins     -> PB11..PB15 (pull-up, short to GND to select)
//!      PB11 -> 0 ticks, PB12 -> 320, PB13 -> 640, PB14 -> 960, PB15 -> 1280
//!
//! Run with `cargo flash-single`

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_stm32::{
    exti::ExtiInput,
    gpio::{Input, Level, Output, Pull, Speed},
};
use embassy_time::{Duration, Timer};
use heapless::Vec;
use speed_pulse::{
    config::ControllerConfig,
    firmware::{self, FirmwareEngine, SpeedSignal},
    hardware::gpio_selector::GpioSelector,
    ramp::{MAX_PRESETS, SpeedRamp},
    speed::SharedSpeed,
};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

static CONFIG: StaticCell<ControllerConfig> = StaticCell::new();

// Written by the control loop, read by the pulse task on every edge
static SPEED: SharedSpeed = SharedSpeed::new(0);

static SPEED_UPDATES: SpeedSignal = SpeedSignal::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 72 MHz system clock from the 8 MHz crystal
    let p = embassy_stm32::init(firmware::rcc_config());
    info!("single timer pulse controller");

    // Validate before anything is driven, then share read-only
    let config = ControllerConfig::single_timer();
    firmware::check_config(&config);
    let config: &'static ControllerConfig = CONFIG.init(config);

    // Pulse output on PA1, starts low; the engine assumes it
    let output = Output::new(p.PA1, Level::Low, Speed::Low);
    // Trigger on PB1 through EXTI line 1
    let trigger = ExtiInput::new(p.PB1, p.EXTI1, Pull::Up);
    // One auto-reload alarm at 1600 Hz
    let engine = firmware::build_engine(output, config);

    // Preset pins PB11..PB15, table order is scan order
    let pins = [
        Input::new(p.PB11, Pull::Up),
        Input::new(p.PB12, Pull::Up),
        Input::new(p.PB13, Pull::Up),
        Input::new(p.PB14, Pull::Up),
        Input::new(p.PB15, Pull::Up),
    ];
    // Every table entry needs its own pin
    defmt::unwrap!(config.presets.check_inputs(pins.len()));
    let selectors: Vec<GpioSelector<'static>, MAX_PRESETS> = config
        .presets
        .iter()
        .zip(pins)
        .map(|(preset, pin)| GpioSelector::new(pin, preset.pin))
        .collect();

    // Publishes the initial speed before the pulse task starts
    let mut ramp = SpeedRamp::new(config, &SPEED);

    defmt::unwrap!(spawner.spawn(pulse_task(engine, trigger)));

    loop {
        // Scan the presets and hand the new speed to the pulse task
        let step = ramp.cycle(selectors.as_slice());
        SPEED_UPDATES.signal(step.level);

        Timer::after(Duration::from_millis(config.timing.cycle_ms)).await;
    }
}

/// Pulse Task
///
/// Owns the pulse output and its alarm. Edges and expiries arrive through
/// the EXTI and time-driver interrupts that wake this task.
#[embassy_executor::task]
async fn pulse_task(engine: FirmwareEngine, trigger: ExtiInput<'static>) {
    firmware::run_pulse(engine, trigger, &SPEED, &SPEED_UPDATES).await
}
