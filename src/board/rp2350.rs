//! RP2350 board
//!
//! Low-level configuration of the Raspberry Pi Pico 2 peripherals used by
//! the controller: clocks, timer, both gate UARTs, the servo PWM slice, the
//! LCD bus, keypad matrix, passage sensors and LEDs.
//!
//! Pin map:
//!
//! | Function               | GPIO              |
//! |------------------------|-------------------|
//! | Entry UART0 TX / RX    | 0 / 1             |
//! | Exit UART1 TX / RX     | 4 / 5             |
//! | Entry / exit sensor    | 2 / 3             |
//! | Entry / exit servo     | 8 (PWM4A) / 9 (PWM4B) |
//! | Red / green LED        | 14 / 15           |
//! | LCD RS, D4..D7 (shared)| 6, 16..19         |
//! | Admin / user LCD EN    | 7 / 20            |
//! | Keypad rows            | 10..13            |
//! | Keypad columns         | 21, 22, 26, 27    |
//!
//! Both LCDs share RS and the data nibble and only differ in their enable
//! line; the shared pins live in [`LCD_BUS`] behind a critical section.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::{ErrorType, OutputPin};
use rp235x_hal as hal;
use hal::fugit::RateExtU32;
use hal::gpio::{DynPinId, FunctionSioInput, FunctionSioOutput, FunctionUart, Pin, PullDown, PullNone, PullUp};
use hal::pac;
use hal::uart::{DataBits, Enabled, StopBits, UartConfig, UartDevice, UartPeripheral, ValidUartPinout};

use super::{Board, Devices, Monotonic, SerialLine, discard_backlog};
use crate::config::UART_BAUD;
use crate::drivers::{Hd44780, Indicator, MatrixKeypad, Polarity, ServoGate};

/// External crystal frequency used by the Raspberry Pi Pico 2.
const XTAL_FREQ_HZ: u32 = 12_000_000u32;

/// System clock divided down to a 1 MHz PWM counter.
const SERVO_PWM_DIV: u8 = 150;

/// 20 ms servo frame at 1 MHz.
const SERVO_PWM_TOP: u16 = 19_999;

pub type OutPin = Pin<DynPinId, FunctionSioOutput, PullDown>;
pub type KeyColumnPin = Pin<DynPinId, FunctionSioInput, PullUp>;
pub type SensorPin = Pin<DynPinId, FunctionSioInput, PullNone>;
pub type Timer = hal::Timer<hal::timer::CopyableTimer0>;

pub type EntryUartPins = (
    Pin<hal::gpio::bank0::Gpio0, FunctionUart, PullDown>,
    Pin<hal::gpio::bank0::Gpio1, FunctionUart, PullDown>,
);
pub type ExitUartPins = (
    Pin<hal::gpio::bank0::Gpio4, FunctionUart, PullDown>,
    Pin<hal::gpio::bank0::Gpio5, FunctionUart, PullDown>,
);

type ServoSlice = hal::pwm::Slice<hal::pwm::Pwm4, hal::pwm::FreeRunning>;
pub type EntryServoChannel = hal::pwm::Channel<ServoSlice, hal::pwm::A>;
pub type ExitServoChannel = hal::pwm::Channel<ServoSlice, hal::pwm::B>;

pub type Lcd = Hd44780<LcdPin, Timer>;

pub struct Rp2350Board;

impl Board for Rp2350Board {
    type EntryLine = UartLine<pac::UART0, EntryUartPins>;
    type ExitLine = UartLine<pac::UART1, ExitUartPins>;
    type Display = Lcd;
    type Keypad = MatrixKeypad<OutPin, KeyColumnPin>;
    type EntryServo = ServoGate<EntryServoChannel>;
    type ExitServo = ServoGate<ExitServoChannel>;
    type Sensor = SensorPin;
    type Led = OutPin;
    type Clock = Timer;
}

impl Monotonic for Timer {
    fn now_us(&self) -> u64 {
        self.get_counter().ticks()
    }
}

/// Gate serial line on one of the UARTs.
///
/// The RX interrupt only announces data. The interrupt handler masks it and
/// raises the gate's pending flag; [`SerialLine::receive`] takes the byte,
/// empties the FIFO and re-arms it.
pub struct UartLine<D: UartDevice, P: ValidUartPinout<D>> {
    uart: UartPeripheral<Enabled, D, P>,
}

impl<D: UartDevice, P: ValidUartPinout<D>> UartLine<D, P> {
    pub fn new(uart: UartPeripheral<Enabled, D, P>) -> Self {
        Self { uart }
    }
}

impl<D: UartDevice, P: ValidUartPinout<D>> SerialLine for UartLine<D, P> {
    fn listen(&mut self) {
        self.uart.enable_rx_interrupt();
    }

    fn receive(&mut self) -> u8 {
        let mut byte = [0u8; 1];
        // A framing or break error leaves the ID at 0, checked like any other
        let _ = self.uart.read_full_blocking(&mut byte);
        // The PL011 FIFO would replay later bytes as new requests
        discard_backlog(|buf| self.uart.read_raw(buf).unwrap_or(0));
        self.uart.enable_rx_interrupt();
        byte[0]
    }

    fn send(&mut self, byte: u8) {
        self.uart.write_full_blocking(&[byte]);
    }
}

/// LCD pins: RS, D4..D7, admin EN, user EN.
const LCD_BUS_PINS: usize = 7;
const LCD_RS: usize = 0;
const LCD_DATA: [usize; 4] = [1, 2, 3, 4];
const LCD_ADMIN_EN: usize = 5;
const LCD_USER_EN: usize = 6;

/// Output pins shared by both LCD drivers.
static LCD_BUS: [Mutex<RefCell<Option<OutPin>>>; LCD_BUS_PINS] =
    [const { Mutex::new(RefCell::new(None)) }; LCD_BUS_PINS];

/// Handle to one pin of [`LCD_BUS`].
pub struct LcdPin(usize);

impl LcdPin {
    fn with_pin(&self, f: impl FnOnce(&mut OutPin)) {
        critical_section::with(|cs| {
            if let Some(pin) = LCD_BUS[self.0].borrow_ref_mut(cs).as_mut() {
                f(pin);
            }
        });
    }
}

impl ErrorType for LcdPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for LcdPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.with_pin(|pin| {
            let _ = pin.set_low();
        });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.with_pin(|pin| {
            let _ = pin.set_high();
        });
        Ok(())
    }
}

fn lcd(enable: usize, timer: Timer) -> Lcd {
    Hd44780::new(
        LcdPin(LCD_RS),
        LcdPin(enable),
        LCD_DATA.map(LcdPin),
        timer,
    )
}

/// Peripherals handed over to the USB console.
pub struct UsbParts {
    pub usb: pac::USB,
    pub dpram: pac::USB_DPRAM,
    pub clock: hal::clocks::UsbClock,
    pub resets: pac::RESETS,
}

pub struct Hardware {
    pub devices: Devices<Rp2350Board>,
    pub usb: UsbParts,
}

/// Initializes the entire hardware stack.
///
/// This function:
/// 1.  Takes ownership of the raw PAC peripherals.
/// 2.  Configures the Watchdog and Clocks (System & USB).
/// 3.  Initializes the Microsecond Timer.
/// 4.  Configures both gate UARTs (8N1) and unmasks their interrupts.
/// 5.  Starts the 50 Hz servo PWM slice.
/// 6.  Configures GPIOs (LEDs, sensors, keypad, LCD bus).
///
/// Device-level setup (LCD init sequence, LEDs off, gates down, RX
/// notification) is left to the controller's Init state.
pub fn init() -> Hardware {
    // 1. Take ownership of raw peripherals
    let mut pac = pac::Peripherals::take().unwrap();
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // 2. Configure Clocks
    let clocks = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .unwrap();

    // 3. Configure Timer (Microsecond precision)
    let timer = hal::Timer::new_timer0(pac.TIMER0, &mut pac.RESETS, &clocks);

    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // 4. Configure UARTs
    let uart_config = UartConfig::new(UART_BAUD.Hz(), DataBits::Eight, None, StopBits::One);

    let entry_pins: EntryUartPins = (pins.gpio0.into_function(), pins.gpio1.into_function());
    let entry_uart = UartPeripheral::new(pac.UART0, entry_pins, &mut pac.RESETS)
        .enable(uart_config, clocks.peripheral_clock.freq())
        .unwrap();

    let exit_pins: ExitUartPins = (pins.gpio4.into_function(), pins.gpio5.into_function());
    let exit_uart = UartPeripheral::new(pac.UART1, exit_pins, &mut pac.RESETS)
        .enable(uart_config, clocks.peripheral_clock.freq())
        .unwrap();

    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::UART0_IRQ);
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::UART1_IRQ);
    }

    // 5. Configure servo PWM
    let pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
    let mut pwm = pwm_slices.pwm4;
    pwm.set_div_int(SERVO_PWM_DIV);
    pwm.set_top(SERVO_PWM_TOP);
    pwm.enable();
    let mut entry_channel = pwm.channel_a;
    entry_channel.output_to(pins.gpio8);
    let mut exit_channel = pwm.channel_b;
    exit_channel.output_to(pins.gpio9);

    // 6. Configure GPIOs
    let green_led: OutPin = pins.gpio15.into_push_pull_output().into_dyn_pin();
    let red_led: OutPin = pins.gpio14.into_push_pull_output().into_dyn_pin();

    let entry_sensor: SensorPin = pins.gpio2.into_floating_input().into_dyn_pin();
    let exit_sensor: SensorPin = pins.gpio3.into_floating_input().into_dyn_pin();

    let keypad = MatrixKeypad::new(
        [
            pins.gpio10.into_push_pull_output().into_dyn_pin(),
            pins.gpio11.into_push_pull_output().into_dyn_pin(),
            pins.gpio12.into_push_pull_output().into_dyn_pin(),
            pins.gpio13.into_push_pull_output().into_dyn_pin(),
        ],
        [
            pins.gpio21.into_pull_up_input().into_dyn_pin(),
            pins.gpio22.into_pull_up_input().into_dyn_pin(),
            pins.gpio26.into_pull_up_input().into_dyn_pin(),
            pins.gpio27.into_pull_up_input().into_dyn_pin(),
        ],
    );

    let lcd_bus: [OutPin; LCD_BUS_PINS] = [
        pins.gpio6.into_push_pull_output().into_dyn_pin(),
        pins.gpio16.into_push_pull_output().into_dyn_pin(),
        pins.gpio17.into_push_pull_output().into_dyn_pin(),
        pins.gpio18.into_push_pull_output().into_dyn_pin(),
        pins.gpio19.into_push_pull_output().into_dyn_pin(),
        pins.gpio7.into_push_pull_output().into_dyn_pin(),
        pins.gpio20.into_push_pull_output().into_dyn_pin(),
    ];
    critical_section::with(|cs| {
        for (slot, pin) in LCD_BUS.iter().zip(lcd_bus) {
            slot.borrow_ref_mut(cs).replace(pin);
        }
    });

    let devices = Devices {
        entry_line: UartLine::new(entry_uart),
        exit_line: UartLine::new(exit_uart),
        admin_display: lcd(LCD_ADMIN_EN, timer),
        user_display: lcd(LCD_USER_EN, timer),
        keypad,
        entry_servo: ServoGate::new(entry_channel),
        exit_servo: ServoGate::new(exit_channel),
        entry_sensor,
        exit_sensor,
        green_led: Indicator::new(green_led, Polarity::ActiveLow),
        red_led: Indicator::new(red_led, Polarity::ActiveLow),
        clock: timer,
    };

    // Return ready-to-use hardware
    Hardware {
        devices,
        usb: UsbParts {
            usb: pac.USB,
            dpram: pac.USB_DPRAM,
            clock: clocks.usb_clock,
            resets: pac.RESETS,
        },
    }
}

/// Masks the RX notification of a gate UART from its interrupt handler.
///
/// # Safety
///
/// Must only be called from that UART's interrupt handler while the main
/// loop owns the peripheral; it only touches the interrupt mask register.
pub unsafe fn mask_rx_interrupt(uart: *const pac::uart0::RegisterBlock) {
    unsafe {
        (*uart)
            .uartimsc()
            .modify(|_, w| w.rxim().clear_bit().rtim().clear_bit());
    }
}
