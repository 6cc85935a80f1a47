use embassy_usb::{
    class::hid::{ReportId, RequestHandler},
    control::OutResponse,
};
use embedded_hal::digital::OutputPin;

use crate::info;

pub const NUM_LOCK: u8 = 1 << 0;
pub const CAPS_LOCK: u8 = 1 << 1;
pub const SCROLL_LOCK: u8 = 1 << 2;
pub const COMPOSE: u8 = 1 << 3;
pub const KANA: u8 = 1 << 4;

/// The board's indicator LED. Wired active low: driving the pin low
/// lights it.
pub struct StatusLed<O: OutputPin> {
    pin: O,
}

impl<O: OutputPin> StatusLed<O> {
    pub fn new(pin: O) -> Self {
        Self { pin }
    }

    pub fn set(&mut self, on: bool) {
        let _ = if on {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        };
    }
}

/// Mirrors the host's keyboard LED state onto the status LED.
///
/// The host reports lock-key state as a one-byte output report; the LED
/// lights while any bit of `mask` is set. Nothing in the scan/report
/// path touches this; it only ever runs from the Interrupt Out pipe.
pub struct LedHandler<O: OutputPin> {
    led: StatusLed<O>,
    mask: u8,
}

impl<O: OutputPin> LedHandler<O> {
    pub fn new(led: StatusLed<O>, mask: u8) -> Self {
        Self { led, mask }
    }
}

impl<O: OutputPin> RequestHandler for LedHandler<O> {
    fn get_report(&mut self, id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        info!("Get report for {:?}", id);
        None
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        if let (ReportId::Out(0), Some(&leds)) = (id, data.first()) {
            self.led.set(leds & self.mask != 0);
        }
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, id: Option<ReportId>, dur: u32) {
        info!("Set idle rate for {:?} to {:?}", id, dur);
    }

    fn get_idle_ms(&mut self, id: Option<ReportId>) -> Option<u32> {
        info!("Get idle rate for {:?}", id);
        None
    }
}

#[cfg(test)]
#[path = "led_test.rs"]
mod test;
