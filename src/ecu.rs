//! ECU orchestration: shared controller state and the device sequences the
//! state handlers run.
//!
//! [`Ecu`] owns the slot registry, the display-refresh request and the
//! devices, and borrows the pending-event latches that the serial interrupts
//! raise. None of its operations can fail: an unknown ID is a regular branch,
//! and device errors are ignored the same way the hardware layer ignores them.

use core::fmt::Write as FmtWrite;

use embedded_hal::digital::InputPin;
use heapless::String;

use crate::board::{Board, CharDisplay, Devices, GatePosition, GateServo, Keypad, SerialLine};
use crate::config::{BLINK_CYCLES, BLINK_HALF_PERIOD_US, NO_KEY, USERS_COUNT};
use crate::events::{Gate, GateEvents};
use crate::registry::{IdCheck, SlotRegistry};

pub struct Ecu<B: Board> {
    pub devices: Devices<B>,
    pub registry: SlotRegistry,
    pub events: &'static GateEvents,
    slots_print_requested: bool,
}

impl<B: Board> Ecu<B> {
    /// Boot state: empty lot, no IDs, no refresh pending.
    pub fn new(devices: Devices<B>, events: &'static GateEvents) -> Self {
        Self::with_registry(devices, events, SlotRegistry::new())
    }

    pub fn with_registry(
        devices: Devices<B>,
        events: &'static GateEvents,
        registry: SlotRegistry,
    ) -> Self {
        Self {
            devices,
            registry,
            events,
            slots_print_requested: false,
        }
    }

    /// Brings every device to its idle state and arms both serial lines.
    pub fn init(&mut self) {
        let devices = &mut self.devices;

        devices.admin_display.init();
        devices.user_display.init();

        devices.green_led.off();
        devices.red_led.off();

        devices.entry_servo.set_position(GatePosition::Down);
        devices.exit_servo.set_position(GatePosition::Down);

        devices.entry_line.listen();
        devices.exit_line.listen();

        log_info!("devices initialized, {} slots", self.registry.capacity());
    }

    /// Collects the authorized IDs from the keypad, one per user, then leaves
    /// the admin display on the "System is ON" summary.
    pub fn admin_enroll(&mut self) {
        let devices = &mut self.devices;
        let display = &mut devices.admin_display;

        display.write_str_at("Enter users' IDs", 0, 0);

        let mut ids = [0u8; USERS_COUNT];
        for (user, id) in ids.iter_mut().enumerate() {
            display.write_str_at(&user_label(user), user_row(user), 1);

            let key = wait_for_key(&mut devices.keypad);
            display.write_byte(key_glyph(key));
            *id = key;

            log_info!("user {} enrolled with id {}", user + 1, key);
        }
        self.registry.enroll(ids);

        display.clear();
        display.write_str_at("System is ON", 0, 2);
        for (user, &id) in ids.iter().enumerate() {
            display.write_str_at(&user_label(user), user_row(user), 1);
            display.write_byte(key_glyph(id));
        }
    }

    pub fn request_slots_print(&mut self) {
        self.slots_print_requested = true;
    }

    pub fn slots_print_requested(&self) -> bool {
        self.slots_print_requested
    }

    /// Redraws the user display with the free-slot count, only if a refresh
    /// was requested since the last draw.
    pub fn print_free_slots(&mut self) {
        if !self.slots_print_requested {
            return;
        }
        self.slots_print_requested = false;

        let free = self.registry.free_slots();
        let display = &mut self.devices.user_display;

        display.clear();
        display.write_str_at("Welcome!", 0, 3);
        if free == 0 {
            display.write_str_at("Parking is full!", 1, 0);
        } else {
            display.write_byte_at(b'0' + free, 1, 0);
            display.write_str_at("Slots free!", 1, 2);
        }
    }

    /// Services one gate event: consumes the latch, reads and echoes the ID,
    /// then either lets the vehicle through or rejects it.
    pub fn handle_gate(&mut self, gate: Gate) {
        self.events.flag(gate).clear();

        let id = self.receive_id(gate);
        match self.registry.check_id(id) {
            IdCheck::Found => {
                match gate {
                    Gate::Entry => self.registry.occupy(),
                    Gate::Exit => self.registry.release(),
                }
                log_info!(
                    "{} gate: id {} accepted, {} slots free",
                    gate.label(),
                    id,
                    self.registry.free_slots()
                );
                self.open_gate(gate);
            }
            IdCheck::NotFound => {
                log_warn!("{} gate: unknown id {}", gate.label(), id);
                self.reject_unknown_id();
            }
        }

        self.request_slots_print();
    }

    /// Blocking read of one ID byte, echoed back on the same line.
    pub fn receive_id(&mut self, gate: Gate) -> u8 {
        match gate {
            Gate::Entry => {
                let id = self.devices.entry_line.receive();
                self.devices.entry_line.send(id);
                id
            }
            Gate::Exit => {
                let id = self.devices.exit_line.receive();
                self.devices.exit_line.send(id);
                id
            }
        }
    }

    /// Raises the barrier, flashes green, waits for the passage to clear and
    /// lowers the barrier again.
    pub fn open_gate(&mut self, gate: Gate) {
        let notice = match gate {
            Gate::Entry => "Enter gate open!",
            Gate::Exit => "Exit gate open!",
        };
        self.devices.user_display.clear();
        self.devices.user_display.write_str(notice);

        self.move_gate(gate, GatePosition::Up);
        self.devices
            .green_led
            .blink(&self.devices.clock, BLINK_CYCLES, BLINK_HALF_PERIOD_US);
        self.wait_passage_clear(gate);
        self.move_gate(gate, GatePosition::Down);
    }

    /// Unknown ID: notice on the user display, both barriers down, red flash.
    pub fn reject_unknown_id(&mut self) {
        self.devices.user_display.clear();
        self.devices.user_display.write_str("UNKNOWN ID!");

        self.move_gate(Gate::Entry, GatePosition::Down);
        self.move_gate(Gate::Exit, GatePosition::Down);
        self.devices
            .red_led
            .blink(&self.devices.clock, BLINK_CYCLES, BLINK_HALF_PERIOD_US);
    }

    /// Refused request (lot full on entry, lot empty on exit): flushes and
    /// echoes the waiting ID, then flashes red. The display is left alone.
    pub fn trigger_alarm(&mut self, gate: Gate) {
        let id = self.receive_id(gate);
        log_warn!("{} gate: request refused, id {}", gate.label(), id);
        self.devices
            .red_led
            .blink(&self.devices.clock, BLINK_CYCLES, BLINK_HALF_PERIOD_US);
    }

    fn move_gate(&mut self, gate: Gate, position: GatePosition) {
        match gate {
            Gate::Entry => self.devices.entry_servo.set_position(position),
            Gate::Exit => self.devices.exit_servo.set_position(position),
        }
    }

    /// Polls the passage sensor until it reads low. No timeout: a sensor
    /// stuck high keeps the gate open. A failed read counts as blocked.
    fn wait_passage_clear(&mut self, gate: Gate) {
        let sensor = match gate {
            Gate::Entry => &mut self.devices.entry_sensor,
            Gate::Exit => &mut self.devices.exit_sensor,
        };
        while sensor.is_high().unwrap_or(true) {
            core::hint::spin_loop();
        }
    }
}

/// Polls until a real key is pressed.
fn wait_for_key<K: Keypad>(keypad: &mut K) -> u8 {
    loop {
        let key = keypad.read_key();
        if key != NO_KEY {
            return key;
        }
    }
}

/// Digit keys carry raw values 0..=9; show them as ASCII digits.
fn key_glyph(key: u8) -> u8 {
    if key <= 9 { b'0' + key } else { key }
}

fn user_label(user: usize) -> String<16> {
    let mut label = String::new();
    let _ = write!(label, "User{} ID: ", user + 1);
    label
}

fn user_row(user: usize) -> u8 {
    (user + 1) as u8
}
