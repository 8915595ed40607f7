//! The T-state scheduler and pin interface.

use emu_core::Tickable;

use crate::microcode::Action;
use crate::queue::TQueue;
use crate::registers::Registers;
use crate::signals::{Signal, WAIT, WSAMP};

mod execute;

/// Which M1 shape refills the queue when it drains.
///
/// Normally the fetch cycle; latched to the HALT shape by the HALT opcode so
/// the bus keeps showing NOP-shaped cycles until the CPU is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextM1 {
    Fetch,
    HaltNop,
}

/// Pin-level Z80 CPU.
///
/// One call to [`tick`](Z80::tick) is one T-state. Between ticks the host
/// reads the pins ([`address`](Z80::address), [`data`](Z80::data),
/// [`signal`](Z80::signal)) and answers: a byte via [`set_data`](Z80::set_data)
/// on read cycles, a store of [`data`](Z80::data) on write cycles, and
/// optionally the WAIT input via [`set_signal`](Z80::set_signal).
pub struct Z80 {
    /// Register file, open for observation and test setup.
    pub regs: Registers,
    /// Pending T-states of the machine cycles already lowered.
    queue: TQueue,
    /// Pins driven at the last tick, OR-combined with the held inputs.
    signals: u16,
    /// Input pins held by the host (principally WAIT).
    in_signals: u16,
    /// Address bus latch.
    addr: u16,
    /// Data bus latch.
    data: u8,
    /// T-states elapsed.
    ticks: u64,
    next_m1: NextM1,
}

impl Z80 {
    /// A CPU in the reset state: registers zero, queue empty, no pins
    /// asserted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            queue: TQueue::new(),
            signals: 0,
            in_signals: 0,
            addr: 0,
            data: 0,
            ticks: 0,
            next_m1: NextM1::Fetch,
        }
    }

    /// Drive the data bus for the current cycle, as a memory or I/O device
    /// answering a read would.
    pub fn set_data(&mut self, value: u8) {
        self.data = value;
    }

    /// The CPU's data-bus output. Meaningful while WR is asserted and on the
    /// drive T-state of a write cycle.
    #[must_use]
    pub const fn data(&self) -> u8 {
        self.data
    }

    /// Current address bus.
    #[must_use]
    pub const fn address(&self) -> u16 {
        self.addr
    }

    /// Is this pin currently asserted?
    #[must_use]
    pub const fn signal(&self, s: Signal) -> bool {
        self.signals & s.mask() != 0
    }

    /// The full signal word as published at the last tick.
    #[must_use]
    pub const fn signals(&self) -> u16 {
        self.signals
    }

    /// Assert a host-driven input pin.
    pub fn set_signal(&mut self, s: Signal) {
        self.in_signals |= s.mask();
    }

    /// Release a host-driven input pin.
    pub fn rst_signal(&mut self, s: Signal) {
        self.in_signals &= !s.mask();
    }

    /// Load the program counter.
    pub fn set_pc(&mut self, pc: u16) {
        self.regs.set_pc(pc);
    }

    /// Current program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.regs.pc()
    }

    /// T-states elapsed since construction. Increments once per `tick`,
    /// including WAIT-stretched ones.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one T-state.
    ///
    /// Refills the queue with the next M1 shape when it has drained, then
    /// publishes the head T-state's pins. If the head samples WAIT and the
    /// host holds WAIT asserted, the head stays put and the whole bus state
    /// is republished next tick; otherwise the head's retirement action runs
    /// and the head is consumed.
    pub fn tick(&mut self) {
        if self.queue.is_empty() {
            match self.next_m1 {
                NextM1::Fetch => self.queue.add_m1(),
                NextM1::HaltNop => self.queue.add_halt_nop(),
            }
        }

        let t = self.queue.front();
        self.signals = t.signals | self.in_signals;
        if let Some(pair) = t.addr {
            self.addr = self.regs.get16(pair);
        }
        if let Some(reg) = t.data {
            self.data = self.regs.get8(reg);
        }

        let stretched = t.signals & WSAMP != 0 && self.in_signals & WAIT != 0;
        if !stretched {
            self.run(t.op);
            self.queue.pop();
        }

        self.ticks += 1;
    }

    /// Retire one action against the register file.
    fn run(&mut self, op: Action) {
        match op {
            Action::Nop => {}
            Action::Decode => self.decode(),
            Action::RefreshR => self.regs.refresh_r(),
            Action::Inc16(reg) => {
                let v = self.regs.get16(reg);
                self.regs.set16(reg, v.wrapping_add(1));
            }
            Action::Dec16(reg) => {
                let v = self.regs.get16(reg);
                self.regs.set16(reg, v.wrapping_sub(1));
            }
            Action::Assign16 { dst, src } => {
                let v = self.regs.get16(src);
                self.regs.set16(dst, v);
            }
            Action::DataIn(reg) => self.regs.set8(reg, self.data),
            Action::AddOffset(reg) => {
                let displacement = self.data as i8;
                let v = self.regs.get16(reg);
                self.regs.set16(reg, v.wrapping_add(displacement as u16));
            }
        }
    }

    /// Number of T-states pending in the queue.
    #[cfg(test)]
    pub(crate) fn pending(&self) -> u8 {
        self.queue.len()
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Tickable for Z80 {
    fn tick(&mut self) {
        Z80::tick(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{M1, MREQ, RD, RFSH};

    #[test]
    fn first_tick_publishes_the_fetch_address() {
        let mut cpu = Z80::new();
        cpu.set_pc(0x1234);
        cpu.tick();
        assert!(cpu.signal(Signal::M1));
        assert_eq!(cpu.address(), 0x1234);
        // PC post-increments at the publishing T-state.
        assert_eq!(cpu.pc(), 0x1235);
    }

    #[test]
    fn tick_counter_is_strictly_monotonic() {
        let mut cpu = Z80::new();
        for expected in 1..=100 {
            cpu.tick();
            assert_eq!(cpu.ticks(), expected);
        }
    }

    #[test]
    fn queue_never_reaches_capacity() {
        let mut cpu = Z80::new();
        // EX (SP),HL is the longest lowered sequence in the surface.
        cpu.set_data(0xE3);
        for _ in 0..200 {
            cpu.tick();
            assert!(cpu.pending() < 32);
        }
    }

    #[test]
    fn wait_only_stretches_sample_t_states() {
        let mut cpu = Z80::new();
        cpu.set_signal(Signal::WAIT);

        // T1 of M1 does not sample WAIT: it retires normally.
        cpu.tick();
        assert_eq!(cpu.pc(), 1);

        // T2 samples WAIT and must hold, republishing the same bus state.
        cpu.tick();
        let held = cpu.signals();
        assert!(cpu.signal(Signal::WAIT));
        cpu.tick();
        assert_eq!(cpu.signals(), held);
        assert_eq!(cpu.pc(), 1);
        assert_eq!(cpu.ticks(), 3);

        // Release WAIT: the fetch completes as a NOP.
        cpu.rst_signal(Signal::WAIT);
        cpu.set_data(0x00);
        cpu.tick();
        cpu.tick();
        cpu.tick();
        assert_eq!(cpu.regs.r(), 1);
        assert_eq!(cpu.ticks(), 6);
    }

    #[test]
    fn fetch_cycle_signal_sequence() {
        let mut cpu = Z80::new();
        cpu.set_data(0x00); // NOP on the bus throughout

        cpu.tick();
        assert_eq!(cpu.signals(), M1);
        cpu.tick();
        assert_eq!(cpu.signals(), M1 | MREQ | RD | crate::signals::WSAMP);
        cpu.tick();
        assert_eq!(cpu.signals(), RFSH);
        cpu.tick();
        assert_eq!(cpu.signals(), MREQ | RFSH);
        assert_eq!(cpu.regs.r(), 1);
    }
}
