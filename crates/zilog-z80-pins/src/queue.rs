//! Fixed ring of pending T-states and the machine-cycle builders.
//!
//! Builders are purely structural: they append records describing bus
//! activity and retirement work, and nothing here executes. Each builder
//! appends a whole machine cycle (or a deliberate extension of one), never
//! a partial cycle.

use crate::microcode::{Action, Reg8, Reg16, TState};
use crate::signals::{HALT, M1, MREQ, RD, RFSH, WR, WSAMP};

/// Ring capacity. A power of two so indices wrap with a mask.
const LEN: usize = 32;

/// Upper bound on T-states pending at once: the longest lowered sequence
/// plus the tail of the fetch cycle it was appended from.
const LONGEST_SEQUENCE: usize = 24;

const _: () = assert!(LEN.is_power_of_two());
const _: () = assert!(LONGEST_SEQUENCE < LEN);

/// Queue of pending T-states for the cycles already lowered.
#[derive(Debug)]
pub(crate) struct TQueue {
    ops: [TState; LEN],
    /// Index of the next T-state to publish.
    next: u8,
    /// Index one past the last queued T-state.
    last: u8,
}

impl TQueue {
    pub(crate) const fn new() -> Self {
        Self {
            ops: [TState::new(0, None, None, Action::Nop); LEN],
            next: 0,
            last: 0,
        }
    }

    fn wrap(index: u8) -> u8 {
        index.wrapping_add(1) & (LEN as u8 - 1)
    }

    pub(crate) fn push(&mut self, t: TState) {
        debug_assert!((self.len() as usize) < LEN - 1, "T-state queue overflow");
        self.ops[self.last as usize] = t;
        self.last = Self::wrap(self.last);
    }

    /// The T-state at the head, without consuming it.
    pub(crate) fn front(&self) -> TState {
        self.ops[self.next as usize]
    }

    pub(crate) fn pop(&mut self) {
        debug_assert!(!self.is_empty(), "popped an empty T-state queue");
        self.next = Self::wrap(self.next);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.next == self.last
    }

    /// Number of pending T-states.
    pub(crate) fn len(&self) -> u8 {
        self.last.wrapping_sub(self.next) & (LEN as u8 - 1)
    }

    /// Opcode fetch cycle (M1): address out with M1, memory strobes with a
    /// WAIT sample, refresh address with the decode retirement, refresh
    /// counter step.
    pub(crate) fn add_m1(&mut self) {
        self.push(TState::new(M1, Some(Reg16::PC), None, Action::Inc16(Reg16::PC)));
        self.push(TState::new(M1 | MREQ | RD | WSAMP, None, None, Action::Nop));
        self.push(TState::new(RFSH, Some(Reg16::IR), None, Action::Decode));
        self.push(TState::new(MREQ | RFSH, None, None, Action::RefreshR));
    }

    /// The M1 shape emitted while halted: HALT asserted throughout, PC not
    /// advanced, nothing decoded. The refresh counter still steps.
    pub(crate) fn add_halt_nop(&mut self) {
        self.push(TState::new(HALT | M1, Some(Reg16::PC), None, Action::Nop));
        self.push(TState::new(HALT | M1 | MREQ | RD | WSAMP, None, None, Action::Nop));
        self.push(TState::new(HALT | RFSH, Some(Reg16::IR), None, Action::Nop));
        self.push(TState::new(HALT | MREQ | RFSH, None, None, Action::RefreshR));
    }

    /// Memory read cycle: publish `addr` (retiring `first_op`, typically the
    /// PC post-increment), strobe MREQ|RD with a WAIT sample, then capture
    /// the bus byte into `dest`, or leave it on the data latch if `dest`
    /// is `None`.
    pub(crate) fn add_m23_read(&mut self, addr: Reg16, dest: Option<Reg8>, first_op: Action) {
        let capture = match dest {
            Some(reg) => Action::DataIn(reg),
            None => Action::Nop,
        };
        self.push(TState::new(0, Some(addr), None, first_op));
        self.push(TState::new(MREQ | RD | WSAMP, None, None, Action::Nop));
        self.push(TState::new(0, None, None, capture));
    }

    /// Memory write cycle: publish `addr`, drive `data` onto the bus under
    /// MREQ (retiring `op`), then raise the WR strobe.
    pub(crate) fn add_m45_write(&mut self, addr: Reg16, data: Reg8, op: Action) {
        self.push(TState::new(0, Some(addr), None, Action::Nop));
        self.push(TState::new(MREQ | WSAMP, None, Some(data), op));
        self.push(TState::new(MREQ | WR, None, None, Action::Nop));
    }

    /// `t_states` internal T-states with no bus activity; `last_op` retires
    /// on the final one.
    pub(crate) fn add_m3_alu(&mut self, t_states: u8, last_op: Action) {
        debug_assert!(t_states >= 1, "an internal cycle is at least one T-state");
        for _ in 1..t_states {
            self.push(TState::new(0, None, None, Action::Nop));
        }
        self.push(TState::new(0, None, None, last_op));
    }

    /// A single idle T-state extending the current machine cycle.
    pub(crate) fn extend_m(&mut self, op: Action) {
        self.push(TState::new(0, None, None, op));
    }
}
