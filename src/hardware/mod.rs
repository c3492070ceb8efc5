pub mod traits;

#[cfg(feature = "async")]
pub mod bar_graph;

#[cfg(any(test, feature = "firmware"))]
pub mod embassy_alarm;
#[cfg(feature = "firmware")]
pub mod gpio_selector;
