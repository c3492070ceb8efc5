//! STM32 Blue Pill Two-Timer Pulse with Triangle Speed Ramp
//! =============================================================================================
//!
//! Date			Author          Notes
//! 2026-10-18	    speed_pulse     Initial release
//!
//!==============================================================================================
//!
//! The speed walks from 0 to 2240 ticks and back in steps of 320, one step
//! per second. A rising edge on the trigger pin while the speed is at rest
//! gives an immediate 16-tick pulse; above rest the same pulse starts
//! `speed` ticks after the edge. Edges that arrive while a pulse is pending
//! are ignored.
//!
//! The current speed index (speed / 320) is shown on an 8-LED bar graph
//! driven through a 74HC595-style shift register.
//!
//! Hardware Connections:
//!   Trigger input   -> PB1 (pull-up, rising edge)
//!   Pulse output    -> PA1
//!   Shift register:
//!      SER   (data)   -> PA5
//!      SRCLK (strobe) -> PA6
//!      RCLK  (latch)  -> PA7
//!
//! Run with `cargo flash-dual`

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_stm32::{
    exti::ExtiInput,
    gpio::{Level, Output, Pull, Speed},
};
use embassy_time::{Delay, Duration, Timer};
use speed_pulse::{
    config::ControllerConfig,
    firmware::{self, FirmwareEngine, SpeedSignal},
    hardware::{bar_graph::BarGraph, gpio_selector::GpioSelector},
    ramp::SpeedRamp,
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
    info!("dual timer pulse controller");

    // Validate before anything is driven, then share read-only
    let config = ControllerConfig::dual_timer();
    firmware::check_config(&config);
    let config: &'static ControllerConfig = CONFIG.init(config);

    // Pulse output on PA1, starts low; the engine assumes it
    let output = Output::new(p.PA1, Level::Low, Speed::Low);
    // Trigger on PB1 through EXTI line 1
    let trigger = ExtiInput::new(p.PB1, p.EXTI1, Pull::Up);
    // Off and on alarms, both at 1600 Hz
    let engine = firmware::build_engine(output, config);

    // Shift register: SER, SRCLK, RCLK
    let mut bar_graph = BarGraph::new(
        Output::new(p.PA5, Level::Low, Speed::Low),
        Output::new(p.PA6, Level::Low, Speed::Low),
        Output::new(p.PA7, Level::Low, Speed::Low),
    );
    let mut delay = Delay;

    // Triangle mode reads no preset pins
    let no_presets: [GpioSelector<'static>; 0] = [];
    defmt::unwrap!(config.presets.check_inputs(no_presets.len()));

    // Publishes the initial speed before the pulse task starts
    let mut ramp = SpeedRamp::new(config, &SPEED);

    defmt::unwrap!(spawner.spawn(pulse_task(engine, trigger)));

    loop {
        // Step the ramp and hand the new speed to the pulse task
        let step = ramp.cycle(&no_presets);
        SPEED_UPDATES.signal(step.level);

        // Shift out the bar graph, then latch it
        let Ok(()) = bar_graph
            .show(&step.display, &config.timing, &mut delay)
            .await;

        Timer::after(Duration::from_millis(config.timing.cycle_ms)).await;
    }
}

/// Pulse Task
///
/// Owns the pulse output and both alarms. Edges and expiries arrive
/// through the EXTI and time-driver interrupts that wake this task.
#[embassy_executor::task]
async fn pulse_task(engine: FirmwareEngine, trigger: ExtiInput<'static>) {
    firmware::run_pulse(engine, trigger, &SPEED, &SPEED_UPDATES).await
}
