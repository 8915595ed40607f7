//! T-state records and the micro-actions they retire.
//!
//! Every machine cycle is lowered to T-state records before it happens. A
//! record names the pins to publish and, symbolically, the registers the
//! cycle touches; the scheduler resolves the selectors against the register
//! file when the T-state retires. Records therefore never borrow the CPU,
//! which is what lets the CPU own the queue that schedules it.

/// Selects an 8-bit register half.
///
/// Only the halves the opcode lowering actually routes through the bus or
/// retirement actions are listed; the rest of the register file is reached
/// through its 16-bit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    A,
    /// High half of the memory pointer.
    W,
    /// Low half of the memory pointer.
    Z,
    /// High half of the stack pointer.
    S,
    /// Low half of the stack pointer.
    P,
    /// Low half of the scratch buffer.
    BFL,
}

/// Selects a 16-bit register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reg16 {
    BC,
    DE,
    HL,
    SP,
    PC,
    /// Memory pointer.
    WZ,
    /// Interrupt vector / refresh pair; drives the bus during refresh.
    IR,
    /// Scratch buffer for computed addresses.
    BUF,
}

/// Work to perform when a T-state retires.
///
/// Runs after the T-state's pins have been published, before the next
/// T-state publishes. `Decode` is the only variant that appends further
/// records to the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Action {
    /// No retirement work.
    #[default]
    Nop,
    /// Decode the opcode byte on the data latch and lower it.
    Decode,
    /// Refresh counter step: low 7 bits increment, bit 7 preserved.
    RefreshR,
    Inc16(Reg16),
    Dec16(Reg16),
    /// Copy one pair into another.
    Assign16 { dst: Reg16, src: Reg16 },
    /// Copy the data latch into a register half.
    DataIn(Reg8),
    /// Add the data latch, as a signed 8-bit displacement, to a pair.
    AddOffset(Reg16),
}

/// One pending T-state: the pin state to publish and the work to retire.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TState {
    /// Control pins for this clock period.
    pub signals: u16,
    /// Pair that drives the address bus, or `None` to hold the latch.
    pub addr: Option<Reg16>,
    /// Register half that drives the data bus, or `None` to hold the latch.
    pub data: Option<Reg8>,
    /// Retirement action.
    pub op: Action,
}

impl TState {
    pub(crate) const fn new(signals: u16, addr: Option<Reg16>, data: Option<Reg8>, op: Action) -> Self {
        Self {
            signals,
            addr,
            data,
            op,
        }
    }
}
