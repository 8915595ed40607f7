//! Opcode decode and lowering.
//!
//! `decode` runs as the retirement action of M1's third T-state, with the
//! fetched opcode byte on the data latch. It performs register-to-register
//! work directly and appends machine cycles to the queue for everything that
//! touches the bus; no memory traffic happens inside decode itself.

use crate::microcode::{Action, Reg8, Reg16};

use super::{NextM1, Z80};

/// Register operand field: 0=B 1=C 2=D 3=E 4=H 5=L 7=A. Field value 6 is
/// the (HL) slot and never names a register.
fn reg8(index: u8) -> Reg8 {
    match index {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        7 => Reg8::A,
        _ => unreachable!("(HL) slot is not a register"),
    }
}

/// Register-pair operand field: 0=BC 1=DE 2=HL 3=SP.
const fn rp(index: u8) -> Reg16 {
    match index {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::SP,
    }
}

/// The (hi, lo) halves of a register-pair operand field.
const fn rp_halves(index: u8) -> (Reg8, Reg8) {
    match index {
        0 => (Reg8::B, Reg8::C),
        1 => (Reg8::D, Reg8::E),
        2 => (Reg8::H, Reg8::L),
        _ => (Reg8::S, Reg8::P),
    }
}

impl Z80 {
    /// Decode the fetched opcode and lower it onto the T-state queue.
    pub(super) fn decode(&mut self) {
        let op = self.data;

        match op {
            // NOP
            0x00 => {}

            // LD rr, nn (01=BC, 11=DE, 21=HL, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let (hi, lo) = rp_halves((op >> 4) & 3);
                self.read_imm16(hi, lo);
            }

            // LD (BC), A / LD (DE), A
            0x02 | 0x12 => {
                let dst = rp((op >> 4) & 3);
                self.queue.add_m45_write(dst, Reg8::A, Action::Nop);
            }

            // INC rr (03=BC, 13=DE, 23=HL, 33=SP): two extra idle T-states
            // on the fetch cycle carry the increment
            0x03 | 0x13 | 0x23 | 0x33 => {
                let pair = rp((op >> 4) & 3);
                self.queue.extend_m(Action::Inc16(pair));
                self.queue.extend_m(Action::Nop);
            }

            // DEC rr (0B=BC, 1B=DE, 2B=HL, 3B=SP)
            0x0B | 0x1B | 0x2B | 0x3B => {
                let pair = rp((op >> 4) & 3);
                self.queue.extend_m(Action::Dec16(pair));
                self.queue.extend_m(Action::Nop);
            }

            // LD r, n (06=B, 0E=C, 16=D, 1E=E, 26=H, 2E=L, 3E=A)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let r = reg8((op >> 3) & 7);
                self.queue
                    .add_m23_read(Reg16::PC, Some(r), Action::Inc16(Reg16::PC));
            }

            // EX AF, AF'
            0x08 => self.regs.swap_af(),

            // LD A, (BC) / LD A, (DE)
            0x0A | 0x1A => {
                let src = rp((op >> 4) & 3);
                self.queue.add_m23_read(src, Some(Reg8::A), Action::Nop);
            }

            // JR e
            0x18 => self.jr_relative(),

            // LD (nn), HL: operand address into WZ, then L and H out
            0x22 => {
                self.read_imm16(Reg8::W, Reg8::Z);
                self.queue
                    .add_m45_write(Reg16::WZ, Reg8::L, Action::Inc16(Reg16::WZ));
                self.queue
                    .add_m45_write(Reg16::WZ, Reg8::H, Action::Inc16(Reg16::WZ));
            }

            // LD HL, (nn)
            0x2A => {
                self.read_imm16(Reg8::W, Reg8::Z);
                self.queue
                    .add_m23_read(Reg16::WZ, Some(Reg8::L), Action::Inc16(Reg16::WZ));
                self.queue
                    .add_m23_read(Reg16::WZ, Some(Reg8::H), Action::Inc16(Reg16::WZ));
            }

            // LD (nn), A
            0x32 => {
                self.read_imm16(Reg8::W, Reg8::Z);
                self.queue
                    .add_m45_write(Reg16::WZ, Reg8::A, Action::Inc16(Reg16::WZ));
            }

            // LD A, (nn)
            0x3A => {
                self.read_imm16(Reg8::W, Reg8::Z);
                self.queue
                    .add_m23_read(Reg16::WZ, Some(Reg8::A), Action::Inc16(Reg16::WZ));
            }

            // LD (HL), n: immediate staged through the scratch buffer
            0x36 => {
                self.queue
                    .add_m23_read(Reg16::PC, Some(Reg8::BFL), Action::Inc16(Reg16::PC));
                self.queue.add_m45_write(Reg16::HL, Reg8::BFL, Action::Nop);
            }

            // LD r, r' / LD r, (HL) / LD (HL), r (40-7F except 76=HALT)
            0x40..=0x7F if op != 0x76 => {
                let src = op & 7;
                let dst = (op >> 3) & 7;
                if src == 6 {
                    // LD r, (HL)
                    self.queue
                        .add_m23_read(Reg16::HL, Some(reg8(dst)), Action::Nop);
                } else if dst == 6 {
                    // LD (HL), r
                    self.queue.add_m45_write(Reg16::HL, reg8(src), Action::Nop);
                } else {
                    let value = self.regs.get8(reg8(src));
                    self.regs.set8(reg8(dst), value);
                }
            }

            // HALT: subsequent refills emit the HALT-NOP shape
            0x76 => self.next_m1 = NextM1::HaltNop,

            // EXX
            0xD9 => self.regs.exx(),

            // EX (SP), HL
            0xE3 => self.ex_sp_hl(),

            // EX DE, HL
            0xEB => self.regs.swap_de_hl(),

            // LD SP, HL
            0xF9 => {
                let hl = self.regs.hl();
                self.regs.set_sp(hl);
            }

            // Prefix groups (CB/DD/ED/FD), ALU ops, conditional jumps, stack
            // operations and the rest of the map are not lowered: the fetch
            // cycle completes and the byte is discarded.
            _ => {}
        }
    }

    /// Two operand bytes at PC, low byte first, into a pair's halves.
    fn read_imm16(&mut self, hi: Reg8, lo: Reg8) {
        self.queue
            .add_m23_read(Reg16::PC, Some(lo), Action::Inc16(Reg16::PC));
        self.queue
            .add_m23_read(Reg16::PC, Some(hi), Action::Inc16(Reg16::PC));
    }

    /// JR e: displacement into the data latch, then a five T-state internal
    /// stretch computes PC+e through BUF and WZ.
    fn jr_relative(&mut self) {
        self.queue
            .add_m23_read(Reg16::PC, None, Action::Inc16(Reg16::PC));
        self.queue.add_m3_alu(
            2,
            Action::Assign16 {
                dst: Reg16::BUF,
                src: Reg16::PC,
            },
        );
        self.queue.add_m3_alu(1, Action::AddOffset(Reg16::BUF));
        self.queue.add_m3_alu(
            1,
            Action::Assign16 {
                dst: Reg16::WZ,
                src: Reg16::BUF,
            },
        );
        self.queue.add_m3_alu(
            1,
            Action::Assign16 {
                dst: Reg16::PC,
                src: Reg16::WZ,
            },
        );
    }

    /// EX (SP), HL: the old word comes up through WZ while HL goes out to
    /// the stack, with BUF holding SP+1 for the high-byte accesses.
    fn ex_sp_hl(&mut self) {
        let above = self.regs.sp().wrapping_add(1);
        self.regs.set_buf(above);
        self.queue.add_m23_read(Reg16::SP, Some(Reg8::Z), Action::Nop);
        self.queue.add_m23_read(Reg16::BUF, Some(Reg8::W), Action::Nop);
        self.queue.extend_m(Action::Nop);
        self.queue.add_m45_write(Reg16::BUF, Reg8::H, Action::Nop);
        self.queue.add_m45_write(Reg16::SP, Reg8::L, Action::Nop);
        self.queue.extend_m(Action::Assign16 {
            dst: Reg16::HL,
            src: Reg16::WZ,
        });
        self.queue.extend_m(Action::Nop);
    }
}
