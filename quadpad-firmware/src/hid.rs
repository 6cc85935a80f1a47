use embassy_usb::{
    class::hid::{ReportId, RequestHandler},
    driver::{Driver, Endpoint, EndpointError, EndpointIn, EndpointOut},
};

use crate::warn;

pub struct HidWriter<'d, D: Driver<'d>, const N: usize> {
    ep_in: D::EndpointIn,
}

impl<'d, D: Driver<'d>, const N: usize> HidWriter<'d, D, N> {
    pub fn new(ep_in: <D>::EndpointIn) -> Self {
        Self { ep_in }
    }

    /// Resolves once the host has configured the device and the endpoint
    /// is accepting transfers.
    pub async fn ready(&mut self) {
        self.ep_in.wait_enabled().await;
    }

    /// Writes `report` to its interrupt endpoint. A report is always
    /// exactly `N` bytes, so no zero-length terminator is ever needed.
    pub async fn write(&mut self, report: &[u8; N]) -> Result<(), EndpointError> {
        let max_packet_size = usize::from(self.ep_in.info().max_packet_size);
        for chunk in report.chunks(max_packet_size) {
            self.ep_in.write(chunk).await?;
        }
        Ok(())
    }
}

pub struct HidReader<'d, D: Driver<'d>, const N: usize> {
    ep_out: D::EndpointOut,
}

impl<'d, D: Driver<'d>, const N: usize> HidReader<'d, D, N> {
    pub fn new(ep_out: <D>::EndpointOut) -> Self {
        Self { ep_out }
    }

    /// Delivers output reports from the Interrupt Out pipe to `handler`.
    ///
    /// Boot-protocol reports carry no report id prefix, so everything is
    /// handed over as `ReportId::Out(0)`.
    pub async fn run<T: RequestHandler>(mut self, handler: &mut T) -> ! {
        let mut buf = [0; N];
        loop {
            match self.ep_out.read(&mut buf).await {
                Ok(len) if len > 0 => {
                    handler.set_report(ReportId::Out(0), &buf[..len]);
                }
                Ok(_) => {} // some hosts send unsolicited ZLPs
                Err(EndpointError::BufferOverflow) => {
                    warn!(
                        "Host sent output report larger than the configured maximum output report length ({})",
                        N
                    );
                }
                Err(EndpointError::Disabled) => self.ep_out.wait_enabled().await,
            }
        }
    }
}
