use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal_async::delay::DelayNs;

use crate::config::LoopTiming;
use crate::display::DisplayBuffer;

/// 8-cell bar graph behind a shift register: data, strobe (shift clock)
/// and latch lines.
pub struct BarGraph<D, S, L> {
    data: D,
    strobe: S,
    latch: L,
}

impl<D, S, L> BarGraph<D, S, L>
where
    D: OutputPin,
    S: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
{
    pub fn new(data: D, strobe: S, latch: L) -> Self {
        Self {
            data,
            strobe,
            latch,
        }
    }

    /// Shift `buffer` out from the highest cell down, then latch it.
    pub async fn show<T: DelayNs>(
        &mut self,
        buffer: &DisplayBuffer,
        timing: &LoopTiming,
        delay: &mut T,
    ) -> Result<(), D::Error> {
        for (index, bit) in buffer.strobe_order() {
            info!("bar[{}] = {}", index, bit);
            self.data.set_state(PinState::from(bit))?;

            self.strobe.set_high()?;
            delay.delay_us(timing.strobe_on_us).await;
            self.strobe.set_low()?;
            delay.delay_us(timing.strobe_off_us).await;
        }

        self.latch.set_high()?;
        delay.delay_us(timing.latch_us).await;
        self.latch.set_low()
    }
}
