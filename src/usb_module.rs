//! USB Diagnostic Console
//!
//! CDC-ACM serial port the firmware uses to report controller state changes
//! to a host. The device and port live in critical-section guarded statics so
//! that `USBCTRL_IRQ` can keep the bus enumerated while the dispatch loop is
//! blocked inside a gate sequence. Host input is drained and ignored.

use core::cell::RefCell;
use critical_section::Mutex;
use usb_device::bus::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

use rp235x_hal as hal;
use hal::pac;

use rp235x_hal::pac::interrupt;

type UsbBusType = hal::usb::UsbBus;

const VID_PID: UsbVidPid = UsbVidPid(0x16c0, 0x27dd);

/// Write attempts per `write` call before giving up on a stalled host.
const WRITE_ATTEMPTS: usize = 8;

static CONSOLE_DEVICE: Mutex<RefCell<Option<UsbDevice<UsbBusType>>>> =
    Mutex::new(RefCell::new(None));
static CONSOLE_PORT: Mutex<RefCell<Option<SerialPort<UsbBusType>>>> =
    Mutex::new(RefCell::new(None));

/// Brings up the console and unmasks the USB interrupt.
///
/// Must be called once, before any gate interrupt can fire.
pub fn init(
    usb_periph: pac::USB,
    usb_dpram: pac::USB_DPRAM,
    usb_clock: hal::clocks::UsbClock,
    resets: &mut pac::RESETS,
) {
    let usb_bus = hal::usb::UsbBus::new(usb_periph, usb_dpram, usb_clock, true, resets);

    static mut CONSOLE_BUS: Option<UsbBusAllocator<UsbBusType>> = None;

    // Safety: single call during start-up, interrupts not yet unmasked.
    let bus_allocator: &'static UsbBusAllocator<UsbBusType> = unsafe {
        let bus_ptr = core::ptr::addr_of_mut!(CONSOLE_BUS);
        (*bus_ptr).insert(UsbBusAllocator::new(usb_bus))
    };

    let port = SerialPort::new(bus_allocator);
    let builder = UsbDeviceBuilder::new(bus_allocator, VID_PID).strings(&[
        StringDescriptors::default()
            .manufacturer("Raspberry Pi")
            .product("Parking Gate Console")
            .serial_number("PGATE001"),
    ]);

    let device = match builder {
        Ok(builder) => builder.device_class(usbd_serial::USB_CLASS_CDC).build(),
        Err(_) => {
            defmt::warn!("usb console: bad string descriptors, console disabled");
            return;
        }
    };

    critical_section::with(|cs| {
        CONSOLE_DEVICE.borrow_ref_mut(cs).replace(device);
        CONSOLE_PORT.borrow_ref_mut(cs).replace(port);
    });

    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::USBCTRL_IRQ);
    }
}

/// Queues `data` on the console.
///
/// Drops whatever the host does not accept; diagnostics never block the
/// controller.
pub fn write(data: &[u8]) {
    critical_section::with(|cs| {
        let mut port = CONSOLE_PORT.borrow_ref_mut(cs);
        let Some(port) = port.as_mut() else {
            return;
        };

        let mut pending = data;
        for _ in 0..WRITE_ATTEMPTS {
            if pending.is_empty() {
                break;
            }
            match port.write(pending) {
                Ok(n) => pending = &pending[n..],
                Err(_) => break,
            }
        }
    });
}

#[allow(non_snake_case)]
#[interrupt]
fn USBCTRL_IRQ() {
    critical_section::with(|cs| {
        let mut device = CONSOLE_DEVICE.borrow_ref_mut(cs);
        let mut port = CONSOLE_PORT.borrow_ref_mut(cs);

        if let (Some(device), Some(port)) = (device.as_mut(), port.as_mut()) {
            if device.poll(&mut [port]) {
                let mut sink = [0u8; 64];
                while let Ok(n) = port.read(&mut sink) {
                    if n == 0 {
                        break;
                    }
                }
            }
        }
    });
}
