use embassy_futures::select::select3;
use embassy_usb::{driver::Driver, Config};
use embedded_hal::digital::{InputPin, OutputPin};
use static_cell::StaticCell;

use crate::{
    key_reporter::Reporter,
    key_scanner::KeyScanner,
    layout::Layout,
    led::{LedHandler, StatusLed, CAPS_LOCK},
    report::REPORT_LEN,
    usb::{Configurator, State, UsbBuffers, BOOT_KEYBOARD_REPORT_DESC, BOOT_SUBCLASS,
        KEYBOARD_PROTOCOL},
};

static USB_CONFIG: StaticCell<Configurator> = StaticCell::new();
static USB_BUFFERS: StaticCell<UsbBuffers> = StaticCell::new();
static HID_STATE: StaticCell<State> = StaticCell::new();

pub struct KeyboardBuilder<
    D: Driver<'static>,
    I: InputPin,
    O: OutputPin,
    L: OutputPin,
    const COLS: usize,
    const ROWS: usize,
> {
    usb_config: Config<'static>,
    driver: Option<D>,
    input_pins: Option<[I; COLS]>,
    output_pins: Option<[O; ROWS]>,
    led_pin: Option<L>,
    layout: Layout<ROWS, COLS>,
    led_mask: u8,
}

impl<
        D: Driver<'static> + 'static,
        I: InputPin,
        O: OutputPin,
        L: OutputPin,
        const COLS: usize,
        const ROWS: usize,
    > KeyboardBuilder<D, I, O, L, COLS, ROWS>
{
    pub fn new(
        vid: u16,
        pid: u16,
        driver: D,
        input_pins: [I; COLS],
        output_pins: [O; ROWS],
        led_pin: L,
        layout: Layout<ROWS, COLS>,
    ) -> Self {
        Self {
            usb_config: Config::new(vid, pid),
            driver: Some(driver),
            input_pins: Some(input_pins),
            output_pins: Some(output_pins),
            led_pin: Some(led_pin),
            layout,
            led_mask: CAPS_LOCK,
        }
    }

    pub fn manufacturer(mut self, value: &'static str) -> Self {
        self.usb_config.manufacturer = Some(value);
        self
    }

    pub fn product(mut self, value: &'static str) -> Self {
        self.usb_config.product = Some(value);
        self
    }

    pub fn serial_number(mut self, value: &'static str) -> Self {
        self.usb_config.serial_number = Some(value);
        self
    }

    pub fn max_power(mut self, value: u16) -> Self {
        self.usb_config.max_power = value;
        self
    }

    /// Which lock-key bits light the status LED.
    pub fn led_mask(mut self, value: u8) -> Self {
        self.led_mask = value;
        self
    }

    pub fn build(self) -> Keyboard<D, I, O, L, COLS, ROWS> {
        Keyboard { builder: self }
    }
}

pub struct Keyboard<
    D: Driver<'static>,
    I: InputPin,
    O: OutputPin,
    L: OutputPin,
    const COLS: usize,
    const ROWS: usize,
> {
    builder: KeyboardBuilder<D, I, O, L, COLS, ROWS>,
}

impl<
        D: Driver<'static> + 'static,
        I: InputPin,
        O: OutputPin,
        L: OutputPin,
        const COLS: usize,
        const ROWS: usize,
    > Keyboard<D, I, O, L, COLS, ROWS>
{
    /// Brings up the USB device and runs the keyboard forever: the scan
    /// loop, the USB state machine and the LED report reader as sibling
    /// futures on the caller's executor.
    pub async fn run(mut self) -> ! {
        let scanner = KeyScanner::new(
            self.builder.input_pins.take().unwrap(),
            self.builder.output_pins.take().unwrap(),
        );
        let mut led_handler = LedHandler::new(
            StatusLed::new(self.builder.led_pin.take().unwrap()),
            self.builder.led_mask,
        );
        let driver = self.builder.driver.take().unwrap();

        let usb_config: &'static mut Configurator =
            USB_CONFIG.init(Configurator::new(self.builder.usb_config));
        let usb_buffers: &'static mut UsbBuffers = USB_BUFFERS.init(UsbBuffers::default());

        let mut usb_builder = usb_config.usb_builder(driver, usb_buffers).unwrap();

        let hid_state: &'static mut State<'static> = HID_STATE.init(State::default());
        let (hid_writer, hid_reader) = usb_config.add_iface::<_, REPORT_LEN, REPORT_LEN>(
            &mut usb_builder,
            &BOOT_KEYBOARD_REPORT_DESC,
            true,
            BOOT_SUBCLASS,
            KEYBOARD_PROTOCOL,
            hid_state,
        );

        let reporter = Reporter::new(hid_writer);
        let scan_fut = reporter.run(scanner, self.builder.layout);

        let led_fut = hid_reader.unwrap().run(&mut led_handler);

        let mut usb = usb_builder.build();
        let usb_fut = usb.run();

        select3(scan_fut, usb_fut, led_fut).await;
        unreachable!()
    }
}
