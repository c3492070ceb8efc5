use core::fmt;

/// Rejected controller configuration. Returned by
/// [`ControllerConfig::validate`](crate::config::ControllerConfig::validate)
/// and by [`TimerClock::for_frequency`](crate::alarm::TimerClock::for_frequency).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `min` is above `max`.
    InvertedBounds { min: u32, max: u32 },
    ZeroIncrement,
    /// A bound is not a whole number of increments.
    MisalignedBound { bound: u32, increment: u32 },
    /// `max / increment` does not fit in the 8-cell display.
    DisplayOverflow { max_index: u32 },
    ZeroFrequency,
    /// `base / tick` is outside `1..=MAX_DIVIDER`.
    DividerOutOfRange { divider: u32 },
    /// A preset or the initial speed lies outside `[min, max]`.
    SpeedOutOfBounds { speed: u32 },
    TooManyPresets,
    /// The board wires a different number of selector pins than the table has.
    PresetInputMismatch { presets: usize, inputs: usize },
    /// The same pin is assigned to two roles.
    PinConflict,
}

/// Crate-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Startup configuration is invalid; initialization must stop.
    Config(ConfigError),
    /// Speed maps to a display cell that does not exist.
    DisplayIndex { index: u32 },
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvertedBounds { min, max } => {
                write!(f, "min speed {min} is above max speed {max}")
            }
            ConfigError::ZeroIncrement => f.write_str("speed increment is zero"),
            ConfigError::MisalignedBound { bound, increment } => {
                write!(f, "bound {bound} is not a multiple of increment {increment}")
            }
            ConfigError::DisplayOverflow { max_index } => {
                write!(f, "max display index {max_index} exceeds 7")
            }
            ConfigError::ZeroFrequency => f.write_str("timer frequency is zero"),
            ConfigError::DividerOutOfRange { divider } => {
                write!(f, "timer divider {divider} out of range")
            }
            ConfigError::SpeedOutOfBounds { speed } => {
                write!(f, "speed {speed} outside speed bounds")
            }
            ConfigError::TooManyPresets => f.write_str("too many preset entries"),
            ConfigError::PresetInputMismatch { presets, inputs } => {
                write!(f, "{presets} presets but {inputs} selector pins")
            }
            ConfigError::PinConflict => f.write_str("pin assigned to more than one role"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(err) => write!(f, "invalid configuration: {err}"),
            Error::DisplayIndex { index } => write!(f, "display index {index} out of range"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl core::error::Error for Error {}
