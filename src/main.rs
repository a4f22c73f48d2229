//! SPDX-License-Identifier: MIT OR Apache-2.0
//!
//! # Parking Gate Firmware
//!
//! Two-gate parking controller on the RP2350:
//! - **Board:** HAL setup of clocks, UARTs, PWM and GPIOs (`board::rp2350`).
//! - **USB Module:** diagnostic console reporting state changes (`usb_module.rs`).
//! - **FSM:** typed state machine driving the lot (`parking_fsm`).
//!
//! The UART interrupts only raise the gate's pending flag; all control logic
//! runs in the dispatch loop below.
//!
//! Target: Raspberry Pi Pico 2 (RP2350).

#![no_std]
#![no_main]

// --- Imports ---
use core::fmt::Write as FmtWrite;
use defmt::*;
use defmt_rtt as _;
use heapless::String;
use panic_probe as _;

use parking_gate::board::rp2350;
use parking_gate::{Controller, Ecu, GATE_EVENTS};

// --- Modules ---
mod usb_module;

// --- HAL Selection ---
use rp235x_hal as hal;
use hal::entry;
use hal::pac;

// Select appropriate interrupt macro based on chip architecture
use rp235x_hal::pac::interrupt;

// --- Bootloader Configuration ---

#[unsafe(link_section = ".start_block")]
#[used]
pub static IMAGE_DEF: hal::block::ImageDef = hal::block::ImageDef::secure_exe();

/// Entry point.
#[entry]
fn main() -> ! {
    info!("Parking gate controller start");

    // 1. Initialize Hardware Stack (Clocks, Timer, UARTs, PWM, GPIO)
    let mut hw = rp2350::init();

    // 2. Initialize USB diagnostic console
    usb_module::init(
        hw.usb.usb,
        hw.usb.dpram,
        hw.usb.clock,
        &mut hw.usb.resets,
    );

    // 3. Initialize Application State (FSM in Init)
    let controller = Controller::new(Ecu::new(hw.devices, &GATE_EVENTS));

    // 4. Dispatch Loop: one state handler per pass, state changes logged to USB
    controller.run_with(|state| {
        info!("State: {}", state.label());

        let mut msg: String<64> = String::new();
        if FmtWrite::write_fmt(&mut msg, format_args!("State: {}\r\n", state.label())).is_ok() {
            usb_module::write(msg.as_bytes());
        }
    })
}

// --- Interrupt Handlers ---

#[allow(non_snake_case)]
#[interrupt]
fn UART0_IRQ() {
    unsafe { rp2350::mask_rx_interrupt(pac::UART0::ptr()) };
    GATE_EVENTS.entry.raise();
}

#[allow(non_snake_case)]
#[interrupt]
fn UART1_IRQ() {
    unsafe { rp2350::mask_rx_interrupt(pac::UART1::ptr()) };
    GATE_EVENTS.exit.raise();
}

// --- Metadata ---

#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [hal::binary_info::EntryAddr; 4] = [
    hal::binary_info::rp_cargo_bin_name!(),
    hal::binary_info::rp_cargo_version!(),
    hal::binary_info::rp_program_description!(c"Parking Gate Controller"),
    hal::binary_info::rp_program_build_attribute!()
];
