//! Parking controller state machine.
//!
//! One `Tick` is one scheduling pass: the current state's handler runs to
//! completion and names the next state. Idle and Full are the quiescent pair
//! that poll the pending-event latches; every other state runs once and moves
//! on.
//!
//! | State     | Handler                                   | Next                          |
//! |-----------|-------------------------------------------|-------------------------------|
//! | Init      | bring up devices                          | Admin                         |
//! | Admin     | enroll IDs, request slot display          | Idle                          |
//! | Idle      | redraw if requested, poll latches         | ExitGate / EnterGate / Idle   |
//! | EnterGate | handle entry ID                           | Idle if free slots, else Full |
//! | ExitGate  | handle exit ID                            | Idle if free slots, else Full |
//! | Full      | redraw if requested, refuse entries       | ExitGate / Full               |

use typed_fsm::{Transition, state_machine};

use crate::board::ActiveBoard;
use crate::ecu::Ecu;
use crate::events::Gate;

/// Controller context on the board of this build.
pub type ParkingContext = Ecu<ActiveBoard>;

#[derive(Clone, Copy, Debug)]
pub enum ParkingEvent {
    /// One pass of the dispatch loop.
    Tick,
}

state_machine! {
    Name: ParkingFsm,
    Context: ParkingContext,
    Event: ParkingEvent,
    States: {
        Init => {
            entry: |_ctx| {
                log_debug!("state: INIT");
            }
            process: |ctx, _evt| {
                ctx.init();
                Transition::To(ParkingFsm::Admin)
            }
        },

        Admin => {
            entry: |_ctx| {
                log_debug!("state: ADMIN");
            }
            process: |ctx, _evt| {
                ctx.admin_enroll();
                ctx.request_slots_print();
                Transition::To(ParkingFsm::Idle)
            }
        },

        Idle => {
            entry: |ctx| {
                log_debug!("state: IDLE ({} free)", ctx.registry.free_slots());
            }
            process: |ctx, _evt| {
                ctx.print_free_slots();

                let mut next = Transition::None;

                if ctx.events.exit.is_raised() {
                    if ctx.registry.is_vacant() {
                        // Nobody is parked: refuse and stay
                        ctx.events.exit.clear();
                        ctx.trigger_alarm(Gate::Exit);
                    } else {
                        next = Transition::To(ParkingFsm::ExitGate);
                    }
                }

                // Idle is only entered with free slots, so no capacity check.
                // Entry wins when both latches are raised.
                if ctx.events.entry.is_raised() {
                    next = Transition::To(ParkingFsm::EnterGate);
                }

                next
            }
        },

        EnterGate => {
            entry: |_ctx| {
                log_debug!("state: ENTER_GATE");
            }
            process: |ctx, _evt| {
                ctx.handle_gate(Gate::Entry);
                if ctx.registry.is_full() {
                    Transition::To(ParkingFsm::Full)
                } else {
                    Transition::To(ParkingFsm::Idle)
                }
            }
        },

        ExitGate => {
            entry: |_ctx| {
                log_debug!("state: EXIT_GATE");
            }
            process: |ctx, _evt| {
                ctx.handle_gate(Gate::Exit);
                if ctx.registry.is_full() {
                    Transition::To(ParkingFsm::Full)
                } else {
                    Transition::To(ParkingFsm::Idle)
                }
            }
        },

        Full => {
            entry: |_ctx| {
                log_debug!("state: FULL");
            }
            process: |ctx, _evt| {
                ctx.print_free_slots();

                if ctx.events.entry.is_raised() {
                    ctx.events.entry.clear();
                    ctx.trigger_alarm(Gate::Entry);
                }

                // Freeing a slot is always allowed
                if ctx.events.exit.is_raised() {
                    Transition::To(ParkingFsm::ExitGate)
                } else {
                    Transition::None
                }
            }
        }
    }
}

/// Observable controller state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParkingState {
    Init,
    Admin,
    Idle,
    EnterGate,
    ExitGate,
    Full,
}

impl ParkingState {
    pub fn label(self) -> &'static str {
        match self {
            ParkingState::Init => "INIT",
            ParkingState::Admin => "ADMIN",
            ParkingState::Idle => "IDLE",
            ParkingState::EnterGate => "ENTER_GATE",
            ParkingState::ExitGate => "EXIT_GATE",
            ParkingState::Full => "FULL",
        }
    }
}

impl From<&ParkingFsm> for ParkingState {
    fn from(fsm: &ParkingFsm) -> Self {
        match fsm {
            ParkingFsm::Init => ParkingState::Init,
            ParkingFsm::Admin => ParkingState::Admin,
            ParkingFsm::Idle => ParkingState::Idle,
            ParkingFsm::EnterGate => ParkingState::EnterGate,
            ParkingFsm::ExitGate => ParkingState::ExitGate,
            ParkingFsm::Full => ParkingState::Full,
        }
    }
}

impl From<ParkingState> for ParkingFsm {
    fn from(state: ParkingState) -> Self {
        match state {
            ParkingState::Init => ParkingFsm::Init,
            ParkingState::Admin => ParkingFsm::Admin,
            ParkingState::Idle => ParkingFsm::Idle,
            ParkingState::EnterGate => ParkingFsm::EnterGate,
            ParkingState::ExitGate => ParkingFsm::ExitGate,
            ParkingState::Full => ParkingFsm::Full,
        }
    }
}

/// Dispatch loop owner: the state machine plus its context.
pub struct Controller {
    fsm: ParkingFsm,
    ctx: ParkingContext,
}

impl Controller {
    /// Power-on controller, starting in Init.
    pub fn new(ctx: ParkingContext) -> Self {
        Self::starting_in(ctx, ParkingState::Init)
    }

    /// Controller resuming in `state` with the given context.
    pub fn starting_in(mut ctx: ParkingContext, state: ParkingState) -> Self {
        let mut fsm = ParkingFsm::from(state);
        fsm.init(&mut ctx);
        Self { fsm, ctx }
    }

    /// Runs one scheduling pass and returns the resulting state.
    pub fn step(&mut self) -> ParkingState {
        self.fsm.dispatch(&mut self.ctx, &ParkingEvent::Tick);
        self.state()
    }

    pub fn state(&self) -> ParkingState {
        ParkingState::from(&self.fsm)
    }

    pub fn context(&self) -> &ParkingContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ParkingContext {
        &mut self.ctx
    }

    /// Dispatches forever, calling `on_change` after every state change.
    pub fn run_with(mut self, mut on_change: impl FnMut(ParkingState)) -> ! {
        let mut last = self.state();
        loop {
            let state = self.step();
            if state != last {
                last = state;
                on_change(state);
            }
        }
    }
}
