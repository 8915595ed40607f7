//! Host-side glue: answers the CPU's bus transactions from a [`Bus`].
//!
//! The CPU only publishes pins; something has to play the part of the
//! memory and I/O devices on the other side. `Machine` is that something
//! for any [`Bus`] implementation. WAIT policy stays with the caller, which
//! can hold the pin through [`Z80::set_signal`] between steps.

use emu_core::{Bus, Tickable};

use crate::cpu::Z80;
use crate::signals::Signal;

/// A Z80 wired to a bus.
pub struct Machine<B> {
    cpu: Z80,
    bus: B,
}

impl<B: Bus> Machine<B> {
    pub fn new(bus: B) -> Self {
        Self {
            cpu: Z80::new(),
            bus,
        }
    }

    #[must_use]
    pub const fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// One T-state: tick the CPU, then service whatever transaction its
    /// pins request so the data is in place before the next tick.
    ///
    /// A read cycle (including a WAIT-stretched one, which repeats here
    /// harmlessly) answers with the bus byte; a write cycle stores the
    /// CPU's data output; I/O transactions route to the port side.
    pub fn step(&mut self) {
        self.cpu.tick();

        let addr = self.cpu.address();
        if self.cpu.signal(Signal::MREQ) {
            if self.cpu.signal(Signal::RD) {
                let value = self.bus.read(addr);
                self.cpu.set_data(value);
            } else if self.cpu.signal(Signal::WR) {
                self.bus.write(addr, self.cpu.data());
            }
        } else if self.cpu.signal(Signal::IORQ) {
            if self.cpu.signal(Signal::RD) {
                let value = self.bus.io_read(addr);
                self.cpu.set_data(value);
            } else if self.cpu.signal(Signal::WR) {
                self.bus.io_write(addr, self.cpu.data());
            }
        }
    }

    /// Run `n` T-states.
    pub fn steps(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }
}

impl<B: Bus> Tickable for Machine<B> {
    fn tick(&mut self) {
        self.step();
    }
}
