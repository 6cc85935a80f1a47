#![no_std]
pub mod exec;
pub mod hid;
pub mod key_reporter;
pub mod key_scanner;
pub mod keycodes;
pub mod layout;
pub mod led;
pub mod report;
pub mod usb;

#[cfg(test)]
pub(crate) mod switch_test_stub;
#[cfg(test)]
pub(crate) mod time_driver_test_stub;

#[macro_use]
mod macros;
