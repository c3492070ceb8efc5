use crate::config::DISPLAY_CELLS;
use crate::error::Error;

/// One-hot bar-graph image: exactly one cell set, at `level / increment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayBuffer {
    cells: [bool; DISPLAY_CELLS],
}

impl DisplayBuffer {
    /// Buffer for `level`, or [`Error::DisplayIndex`] when the index falls
    /// outside the display or `increment` is zero.
    pub fn for_level(level: u32, increment: u32) -> Result<Self, Error> {
        let index = level
            .checked_div(increment)
            .ok_or(Error::DisplayIndex { index: u32::MAX })?;

        let mut cells = [false; DISPLAY_CELLS];
        let cell = cells
            .get_mut(index as usize)
            .ok_or(Error::DisplayIndex { index })?;
        *cell = true;
        Ok(Self { cells })
    }

    /// Like [`for_level`](Self::for_level) but saturating at the last cell.
    pub fn clamped(level: u32, increment: u32) -> Self {
        let index = level
            .checked_div(increment)
            .map_or(0, |index| index.min(DISPLAY_CELLS as u32 - 1));

        let mut cells = [false; DISPLAY_CELLS];
        cells[index as usize] = true;
        Self { cells }
    }

    pub fn cells(&self) -> &[bool; DISPLAY_CELLS] {
        &self.cells
    }

    pub fn index(&self) -> usize {
        self.cells.iter().position(|&set| set).unwrap_or(0)
    }

    /// Cells in shift order, highest index first.
    pub fn strobe_order(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.cells.iter().copied().enumerate().rev()
    }
}
