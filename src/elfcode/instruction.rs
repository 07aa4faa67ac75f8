// elfcode/instruction.rs
use std::fmt;

use super::errors::ProgramError;
use super::opcode::{Mode, Opcode};
use super::registers::{RegisterFile, Word};

/// One `opcode a b c` record. How `a` and `b` are read depends on the
/// opcode; `c` is always the destination register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub a: Word,
    pub b: Word,
    pub c: Word,
}

impl Instruction {
    pub const fn new(op: Opcode, a: Word, b: Word, c: Word) -> Self {
        Instruction { op, a, b, c }
    }

    /// Checks the register operands. `index` is only used for reporting.
    pub fn validate(&self, index: usize) -> Result<(), ProgramError> {
        let bad = |operand, register| ProgramError::InvalidRegister { index, operand, register };
        if !RegisterFile::is_valid(self.c) {
            return Err(bad('c', self.c));
        }
        let (ma, mb) = self.op.modes();
        if ma == Mode::Register && !RegisterFile::is_valid(self.a) {
            return Err(bad('a', self.a));
        }
        if mb == Mode::Register && !RegisterFile::is_valid(self.b) {
            return Err(bad('b', self.b));
        }
        Ok(())
    }

    #[inline]
    pub fn execute(&self, regs: &mut RegisterFile) {
        self.op.execute(regs, self.a, self.b, self.c as usize);
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.op, self.a, self.b, self.c)
    }
}
