//! End-to-end controller runs on the mock board.

use parking_gate::board::GatePosition;
use parking_gate::board::mock::MockBoard;
use parking_gate::config::{BLINK_CYCLES, NO_KEY, NO_OF_SLOTS};
use parking_gate::{Controller, Ecu, GateEvents, ParkingState};

fn leaked_events() -> &'static GateEvents {
    Box::leak(Box::new(GateEvents::new()))
}

/// Boots a controller with `ids` typed on the keypad and runs it until the
/// first slot count is on the user display.
fn booted(ids: [u8; 3]) -> Controller {
    let mut devices = MockBoard::devices();
    devices.keypad.push_keys(&[ids[0], NO_KEY, ids[1], ids[2]]);

    let mut controller = Controller::new(Ecu::new(devices, leaked_events()));
    assert_eq!(controller.step(), ParkingState::Admin);
    assert_eq!(controller.step(), ParkingState::Idle);
    assert_eq!(controller.step(), ParkingState::Idle);
    controller
}

fn check_invariants(controller: &Controller) {
    let free = controller.context().registry.free_slots();
    assert!(free <= NO_OF_SLOTS);
    match controller.state() {
        ParkingState::Idle => assert!(free > 0, "idle with a full lot"),
        ParkingState::Full => assert_eq!(free, 0, "full with free slots"),
        ParkingState::EnterGate => assert!(free > 0, "entry gate served with a full lot"),
        _ => {}
    }
}

fn entry_request(controller: &mut Controller, id: u8) {
    let ctx = controller.context_mut();
    ctx.devices.entry_line.push_incoming(id);
    ctx.events.entry.raise();
}

fn exit_request(controller: &mut Controller, id: u8) {
    let ctx = controller.context_mut();
    ctx.devices.exit_line.push_incoming(id);
    ctx.events.exit.raise();
}

/// Steps until both latches are down and the slot count is redrawn.
fn settle(controller: &mut Controller) -> ParkingState {
    for _ in 0..8 {
        let state = controller.step();
        check_invariants(controller);
        let ctx = controller.context();
        let quiet = !ctx.events.entry.is_raised()
            && !ctx.events.exit.is_raised()
            && !ctx.slots_print_requested();
        if quiet && matches!(state, ParkingState::Idle | ParkingState::Full) {
            return state;
        }
    }
    panic!("controller did not settle");
}

#[test]
fn boot_shows_enrolled_ids_and_free_slots() {
    let controller = booted([4, 5, 6]);
    let ctx = controller.context();

    assert_eq!(ctx.registry.authorized_ids(), Some(&[4, 5, 6]));
    assert_eq!(ctx.devices.admin_display.row(0), "  System is ON");
    assert_eq!(ctx.devices.admin_display.row(2), " User2 ID: 5");
    assert_eq!(ctx.devices.user_display.row(0), "   Welcome!");
    assert_eq!(ctx.devices.user_display.row(1), "3 Slots free!");
    assert_eq!(ctx.devices.entry_servo.position(), Some(GatePosition::Down));
    assert_eq!(ctx.devices.exit_servo.position(), Some(GatePosition::Down));
}

#[test]
fn lot_fills_up_and_drains() {
    let mut controller = booted([4, 5, 6]);

    entry_request(&mut controller, 5);
    assert_eq!(settle(&mut controller), ParkingState::Idle);
    assert_eq!(controller.context().devices.user_display.row(1), "2 Slots free!");

    entry_request(&mut controller, 4);
    assert_eq!(settle(&mut controller), ParkingState::Idle);

    entry_request(&mut controller, 6);
    assert_eq!(settle(&mut controller), ParkingState::Full);
    assert_eq!(controller.context().devices.user_display.row(1), "Parking is full!");

    // Refused at the entry gate, barrier untouched
    let raised_before = controller.context().devices.entry_servo.history().len();
    entry_request(&mut controller, 4);
    assert_eq!(settle(&mut controller), ParkingState::Full);
    assert_eq!(controller.context().devices.entry_servo.history().len(), raised_before);
    assert_eq!(controller.context().devices.entry_line.sent(), &[5, 4, 6, 4]);

    exit_request(&mut controller, 5);
    assert_eq!(settle(&mut controller), ParkingState::Idle);
    assert_eq!(controller.context().registry.free_slots(), 1);
    assert_eq!(controller.context().devices.user_display.row(1), "1 Slots free!");
}

#[test]
fn unknown_entry_id_keeps_gates_down() {
    let mut controller = booted([4, 5, 6]);

    entry_request(&mut controller, 9);
    assert_eq!(controller.step(), ParkingState::EnterGate);
    assert_eq!(controller.step(), ParkingState::Idle);

    let ctx = controller.context();
    assert_eq!(ctx.registry.free_slots(), NO_OF_SLOTS);
    assert_eq!(ctx.devices.user_display.row(0), "UNKNOWN ID!");
    assert!(!ctx.devices.entry_servo.history().contains(&GatePosition::Up));
    assert!(!ctx.devices.exit_servo.history().contains(&GatePosition::Up));

    // Next Idle pass puts the slot count back
    controller.step();
    assert_eq!(controller.context().devices.user_display.row(1), "3 Slots free!");
}

#[test]
fn exit_from_empty_lot_raises_alarm() {
    let mut controller = booted([4, 5, 6]);

    exit_request(&mut controller, 4);
    assert_eq!(controller.step(), ParkingState::Idle);

    let ctx = controller.context();
    assert_eq!(ctx.registry.free_slots(), NO_OF_SLOTS);
    assert_eq!(ctx.devices.exit_line.sent(), &[4]);
    assert!(!ctx.devices.exit_servo.history().contains(&GatePosition::Up));
    assert!(!ctx.events.exit.is_raised());
}

#[test]
fn passage_sensor_holds_barrier_open() {
    let mut controller = booted([4, 5, 6]);
    controller.context_mut().devices.entry_sensor.block_for(5);

    entry_request(&mut controller, 6);
    settle(&mut controller);

    let ctx = controller.context();
    assert!(ctx.devices.entry_sensor.reads() > 5);
    assert_eq!(ctx.devices.entry_servo.position(), Some(GatePosition::Down));
}

#[test]
fn repeated_interrupts_collapse_into_one_request() {
    let mut controller = booted([4, 5, 6]);

    entry_request(&mut controller, 4);
    controller.context().events.entry.raise();
    assert_eq!(settle(&mut controller), ParkingState::Idle);

    // One ID consumed, one slot taken
    assert_eq!(controller.context().registry.free_slots(), NO_OF_SLOTS - 1);
    assert_eq!(controller.context().devices.entry_line.sent(), &[4]);
}

#[test]
fn long_session_keeps_every_led_flash() {
    let mut controller = booted([4, 5, 6]);

    for _ in 0..12 {
        entry_request(&mut controller, 5);
        assert_eq!(settle(&mut controller), ParkingState::Idle);
        exit_request(&mut controller, 5);
        assert_eq!(settle(&mut controller), ParkingState::Idle);
    }

    let ctx = controller.context();
    assert_eq!(ctx.registry.free_slots(), NO_OF_SLOTS);
    assert_eq!(ctx.devices.green_led.pin().times_driven_low(), 24 * BLINK_CYCLES as usize);
    assert_eq!(ctx.devices.entry_line.sent().len(), 12);
    assert_eq!(ctx.devices.exit_line.sent().len(), 12);
}
