use embassy_time::{Duration, Timer};
use embassy_usb::driver::Driver;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::hid::HidWriter;
use crate::key_scanner::KeyScanner;
use crate::layout::Layout;
use crate::report::{BootReport, REPORT_LEN};
use crate::warn;

/// Fixed interval between matrix scans. The only timing contract; there
/// is no debounce or adaptive pacing.
pub const POLL_PERIOD: Duration = Duration::from_millis(10);

/// Owns the boot report and its interrupt endpoint.
///
/// The report is mutated only from [`Reporter::run`]'s poll cycle, so it
/// is always stable and complete by the time a write is awaited.
pub struct Reporter<'d, D: Driver<'d>> {
    hid_writer: HidWriter<'d, D, REPORT_LEN>,
    report: BootReport,
}

impl<'d, D: Driver<'d>> Reporter<'d, D> {
    pub fn new(hid_writer: HidWriter<'d, D, REPORT_LEN>) -> Self {
        Self {
            hid_writer,
            report: BootReport::new(),
        }
    }

    /// The scan loop: waits for the transport to come up, then samples
    /// the matrix every [`POLL_PERIOD`] and transmits the report exactly
    /// once per cycle that changed it.
    pub async fn run<I: InputPin, O: OutputPin, const COLS: usize, const ROWS: usize>(
        mut self,
        mut scanner: KeyScanner<I, O, COLS, ROWS>,
        layout: Layout<ROWS, COLS>,
    ) -> ! {
        self.hid_writer.ready().await;
        loop {
            if scanner.scan(&layout, &mut self.report).await {
                self.send().await;
            }
            Timer::after(POLL_PERIOD).await;
        }
    }

    pub async fn send(&mut self) {
        if let Err(e) = self.hid_writer.write(&self.report.as_bytes()).await {
            warn!("Failed to send report: {:?}", e);
        }
    }

    pub fn report(&self) -> &BootReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut BootReport {
        &mut self.report
    }
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
#[path = "key_reporter_test.rs"]
mod test;
