//! SPDX-License-Identifier: MIT OR Apache-2.0
//!
//! # Parking Gate Controller
//!
//! Control logic of a two-gate parking lot: free-slot tracking, ID
//! authorization over two serial lines, gate servos, indicator LEDs and two
//! character displays.
//!
//! - **State machine:** typed FSM sequencing the controller (`parking_fsm.rs`).
//! - **ECU:** shared state and device sequences (`ecu.rs`).
//! - **Board:** capability traits plus RP2350 and mock boards (`board/`).
//! - **Drivers:** LCD, keypad, servo and LED drivers over `embedded-hal`.
//!
//! The library is `no_std`; host unit tests run against the mock board.

#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod logging;

pub mod board;
pub mod config;
pub mod drivers;
pub mod ecu;
pub mod events;
pub mod parking_fsm;
pub mod registry;

pub use ecu::Ecu;
pub use events::{GATE_EVENTS, Gate, GateEvents};
pub use parking_fsm::{Controller, ParkingContext, ParkingState};
pub use registry::{IdCheck, SlotRegistry};
