#![no_std]
#![no_main]

use panic_probe as _;

use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::{Driver, InterruptHandler};
use quadpad_firmware::exec::KeyboardBuilder;
use quadpad_firmware::keycodes::{KEY_E, KEY_Q, KEY_R, KEY_W};
use quadpad_firmware::layout::Layout;

// ---------------- User Config ------------------

// Q and W on row 0, E and R on row 1
const LAYOUT: Layout<2, 2> = Layout::new([[KEY_W, KEY_Q], [KEY_R, KEY_E]]);

// USB config
const VENDOR_ID: u16 = 0x16c0;
const PRODUCT_ID: u16 = 0x047d;
const MANUFACTURER: &str = "Quadpad";
const PRODUCT: &str = "Quadpad 2x2";
const SERIAL_NUMBER: &str = "quadpad:0001";
const MAX_POWER: u16 = 100;

// ----------- End of user config ----------------

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => InterruptHandler<USB>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());

    let driver = Driver::new(p.USB, Irqs);

    // Columns are inputs with pull-ups; rows are selected by driving
    // their output low one at a time.
    let input_pins = [
        Input::new(p.PIN_26, Pull::Up),
        Input::new(p.PIN_27, Pull::Up),
    ];
    let output_pins = [
        Output::new(p.PIN_14, Level::High),
        Output::new(p.PIN_15, Level::High),
    ];
    let led_pin = Output::new(p.PIN_25, Level::High);

    let keyboard = KeyboardBuilder::new(
        VENDOR_ID, PRODUCT_ID, driver, input_pins, output_pins, led_pin, LAYOUT,
    )
    .manufacturer(MANUFACTURER)
    .product(PRODUCT)
    .serial_number(SERIAL_NUMBER)
    .max_power(MAX_POWER)
    .build();

    keyboard.run().await
}
