use embassy_time::Timer;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::keycodes::KEY_NONE;
use crate::layout::Layout;
use crate::report::BootReport;

/// One bit per switch, row-major, most significant row first. Column `c`
/// of the selected row lands in bit `c` of that row's group.
pub type MatrixBits = u32;

/// Time for the column lines to settle after a row select line changes.
const ROW_SETTLE_MICROS: u64 = 10;

/// Samples the switch matrix and replays changed switches onto a
/// [`BootReport`].
///
/// Columns are inputs with pull-ups, rows are select outputs driven low
/// one at a time; a closed switch pulls its column low. The only state
/// kept between cycles is the previous reading, used for edge detection.
/// There is no debounce; a bouncing switch reports every transition.
pub struct KeyScanner<I: InputPin, O: OutputPin, const COLS: usize, const ROWS: usize> {
    input_pins: [I; COLS],
    output_pins: [O; ROWS],
    bits_last: MatrixBits,
}

impl<I: InputPin, O: OutputPin, const COLS: usize, const ROWS: usize>
    KeyScanner<I, O, COLS, ROWS>
{
    pub fn new(input_pins: [I; COLS], output_pins: [O; ROWS]) -> Self {
        Self {
            input_pins,
            output_pins,
            bits_last: 0,
        }
    }

    pub async fn read_matrix(&mut self) -> MatrixBits {
        let mut bits = 0;
        for op in self.output_pins.iter_mut() {
            let _ = op.set_low();
            Timer::after_micros(ROW_SETTLE_MICROS).await;

            let mut row_bits = 0;
            for (col, ip) in self.input_pins.iter_mut().enumerate() {
                if ip.is_low().unwrap_or(false) {
                    row_bits |= 1 << col;
                }
            }
            let _ = op.set_high();

            bits = (bits << COLS) | row_bits;
        }
        bits
    }

    /// Samples the matrix once and applies every changed switch to
    /// `report` as a press or release, walking bit positions from most
    /// significant to least so mutations land in layout-table order.
    /// Returns whether any mapped key changed; the caller transmits the
    /// report exactly once when it did. Unmapped positions update the
    /// stored reading without raising the flag.
    pub async fn scan(
        &mut self,
        layout: &Layout<ROWS, COLS>,
        report: &mut BootReport,
    ) -> bool {
        let bits = self.read_matrix().await;
        let diff = bits ^ self.bits_last;
        if diff == 0 {
            return false;
        }

        let mut changed = false;
        for bit in (0..ROWS * COLS).rev() {
            let mask = 1 << bit;
            if diff & mask == 0 {
                continue;
            }
            let key = layout.key_for_bit(bit);
            if key == KEY_NONE {
                continue;
            }
            if bits & mask != 0 {
                report.press(key);
            } else {
                report.release(key);
            }
            changed = true;
        }

        self.bits_last = bits;
        changed
    }
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
#[path = "key_scanner_test.rs"]
mod test;
