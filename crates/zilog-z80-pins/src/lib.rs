//! Pin-level, T-state-accurate Zilog Z80 CPU emulator.
//!
//! Each call to `tick()` advances exactly one T-state and leaves the
//! address bus, data bus and control pins exactly as a real Z80 would
//! drive them at that clock edge. The host reads the pins, answers memory
//! and I/O requests through [`Z80::set_data`], and may stretch cycles with
//! the WAIT input, just like hardware on the other side of the socket.

mod cpu;
mod machine;
mod microcode;
mod queue;
mod registers;
mod signals;

pub use cpu::Z80;
pub use machine::Machine;
pub use registers::Registers;
pub use signals::Signal;
