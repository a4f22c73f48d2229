//! Pending-event latches shared between the serial interrupts and the
//! dispatch loop.
//!
//! Each gate direction owns one single-bit latch. The interrupt handler of
//! that direction's serial line is the only writer that raises it, and the
//! gate state handler of the same direction (or the alarm path in Idle/Full)
//! is the only one that clears it. A second byte arriving before the latch is
//! cleared is absorbed: events are never queued.

use core::cell::Cell;
use critical_section::Mutex;

/// Gate direction, one per serial line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Entry,
    Exit,
}

impl Gate {
    pub fn label(self) -> &'static str {
        match self {
            Gate::Entry => "entry",
            Gate::Exit => "exit",
        }
    }
}

/// One-shot "data ready" latch.
pub struct PendingFlag {
    raised: Mutex<Cell<bool>>,
}

impl PendingFlag {
    pub const fn new() -> Self {
        Self {
            raised: Mutex::new(Cell::new(false)),
        }
    }

    /// Called from interrupt context when a byte arrives.
    pub fn raise(&self) {
        critical_section::with(|cs| self.raised.borrow(cs).set(true));
    }

    pub fn is_raised(&self) -> bool {
        critical_section::with(|cs| self.raised.borrow(cs).get())
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.raised.borrow(cs).set(false));
    }
}

impl Default for PendingFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// The two latches of the controller.
pub struct GateEvents {
    pub entry: PendingFlag,
    pub exit: PendingFlag,
}

impl GateEvents {
    pub const fn new() -> Self {
        Self {
            entry: PendingFlag::new(),
            exit: PendingFlag::new(),
        }
    }

    pub fn flag(&self, gate: Gate) -> &PendingFlag {
        match gate {
            Gate::Entry => &self.entry,
            Gate::Exit => &self.exit,
        }
    }
}

impl Default for GateEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Latches of the running firmware, raised by the UART interrupt handlers.
pub static GATE_EVENTS: GateEvents = GateEvents::new();
