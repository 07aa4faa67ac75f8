// elfcode/opcode.rs
use std::fmt;
use std::str::FromStr;

use super::errors::ProgramError;
use super::registers::{REGISTER_COUNT, RegisterFile, Word};

/// How an operand slot is read. Fixed per opcode, never per instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Register,
    Immediate,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    Addr, Addi,
    Mulr, Muli,
    Banr, Bani,
    Borr, Bori,
    Setr, Seti,
    Gtir, Gtri, Gtrr,
    Eqir, Eqri, Eqrr,
}

impl Opcode {
    pub const ALL: [Opcode; 16] = [
        Opcode::Addr, Opcode::Addi,
        Opcode::Mulr, Opcode::Muli,
        Opcode::Banr, Opcode::Bani,
        Opcode::Borr, Opcode::Bori,
        Opcode::Setr, Opcode::Seti,
        Opcode::Gtir, Opcode::Gtri, Opcode::Gtrr,
        Opcode::Eqir, Opcode::Eqri, Opcode::Eqrr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Addr => "addr", Opcode::Addi => "addi",
            Opcode::Mulr => "mulr", Opcode::Muli => "muli",
            Opcode::Banr => "banr", Opcode::Bani => "bani",
            Opcode::Borr => "borr", Opcode::Bori => "bori",
            Opcode::Setr => "setr", Opcode::Seti => "seti",
            Opcode::Gtir => "gtir", Opcode::Gtri => "gtri", Opcode::Gtrr => "gtrr",
            Opcode::Eqir => "eqir", Opcode::Eqri => "eqri", Opcode::Eqrr => "eqrr",
        }
    }

    pub fn from_name(name: &str) -> Option<Opcode> {
        Opcode::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Addressing modes of `(a, b)`.
    pub fn modes(self) -> (Mode, Mode) {
        use Mode::*;
        match self {
            Opcode::Addr | Opcode::Mulr | Opcode::Banr | Opcode::Borr | Opcode::Gtrr | Opcode::Eqrr => {
                (Register, Register)
            }
            Opcode::Addi | Opcode::Muli | Opcode::Bani | Opcode::Bori | Opcode::Gtri | Opcode::Eqri => {
                (Register, Immediate)
            }
            Opcode::Gtir | Opcode::Eqir => (Immediate, Register),
            Opcode::Setr => (Register, Ignored),
            Opcode::Seti => (Immediate, Ignored),
        }
    }

    /// `true` when every register-mode operand is below `width`.
    pub fn operands_valid(self, a: Word, b: Word, width: usize) -> bool {
        let (ma, mb) = self.modes();
        let ok = |r: Word| (0..width.min(REGISTER_COUNT) as Word).contains(&r);
        (ma != Mode::Register || ok(a)) && (mb != Mode::Register || ok(b))
    }

    /// Computes the value destined for `c`. Register-mode operands must
    /// already be validated (see [`Opcode::operands_valid`]).
    pub fn apply(self, regs: &RegisterFile, a: Word, b: Word) -> Word {
        let r = |i: Word| regs.read(i as usize);
        match self {
            Opcode::Addr => r(a).wrapping_add(r(b)),
            Opcode::Addi => r(a).wrapping_add(b),
            Opcode::Mulr => r(a).wrapping_mul(r(b)),
            Opcode::Muli => r(a).wrapping_mul(b),
            Opcode::Banr => r(a) & r(b),
            Opcode::Bani => r(a) & b,
            Opcode::Borr => r(a) | r(b),
            Opcode::Bori => r(a) | b,
            Opcode::Setr => r(a),
            Opcode::Seti => a,
            Opcode::Gtir => (a > r(b)) as Word,
            Opcode::Gtri => (r(a) > b) as Word,
            Opcode::Gtrr => (r(a) > r(b)) as Word,
            Opcode::Eqir => (a == r(b)) as Word,
            Opcode::Eqri => (r(a) == b) as Word,
            Opcode::Eqrr => (r(a) == r(b)) as Word,
        }
    }

    /// Applies the opcode and writes the result to register `c`.
    #[inline]
    pub fn execute(self, regs: &mut RegisterFile, a: Word, b: Word, c: usize) {
        let v = self.apply(regs, a, b);
        regs.write(c, v);
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Opcode {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::from_name(s).ok_or_else(|| ProgramError::UnknownOpcode(s.to_string()))
    }
}
