use super::traits::SelectorInput;
use crate::config::PinId;
use embassy_stm32::gpio::Input;

/// Preset selector pin, pulled up and active when driven low.
pub struct GpioSelector<'d> {
    pin: Input<'d>,
    id: PinId,
}

impl<'d> GpioSelector<'d> {
    /// `pin` must be configured with `Pull::Up`.
    pub fn new(pin: Input<'d>, id: PinId) -> Self {
        Self { pin, id }
    }
}

impl<'d> SelectorInput for GpioSelector<'d> {
    fn is_active(&self) -> bool {
        let active = self.pin.is_low();
        if active {
            trace!("selector {} active", self.id);
        }
        active
    }
}
