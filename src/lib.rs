//! Edge-triggered pulse controller with a speed ramp and bar-graph display.
//!
//! A rising edge on the trigger input produces an output pulse whose width
//! (single timer) or delay (dual timer) follows the shared speed value. A
//! control loop picks that speed from active-low preset pins or ramps it up
//! and down between bounds, and drives an 8-cell bar graph.
//!
//! The board-independent parts build for the host so they can be unit
//! tested; the embassy/STM32 glue sits behind the `firmware` feature.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod alarm;
pub mod config;
pub mod display;
pub mod error;
#[cfg(feature = "firmware")]
pub mod firmware;
pub mod hardware;
pub mod pulse;
pub mod ramp;
pub mod speed;

pub use error::{ConfigError, Error};
