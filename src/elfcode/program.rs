// elfcode/program.rs
use std::fmt;

use super::errors::ProgramError;
use super::instruction::Instruction;
use super::registers::{RegisterFile, Word};

/// A validated, read-only instruction listing bound to an IP register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    ip_register: usize,
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(ip_register: Word, instructions: Vec<Instruction>) -> Result<Self, ProgramError> {
        if !RegisterFile::is_valid(ip_register) {
            return Err(ProgramError::IpRegisterOutOfRange(ip_register));
        }
        for (i, instr) in instructions.iter().enumerate() {
            instr.validate(i)?;
        }
        tracing::debug!(ip_register, len = instructions.len(), "program constructed");
        Ok(Program { ip_register: ip_register as usize, instructions })
    }

    /// Builds a program from `(name, a, b, c)` tuples.
    pub fn from_tuples(ip_register: Word, listing: &[(&str, Word, Word, Word)]) -> Result<Self, ProgramError> {
        let instructions = listing
            .iter()
            .map(|&(name, a, b, c)| -> Result<Instruction, ProgramError> {
                Ok(Instruction::new(name.parse()?, a, b, c))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Program::new(ip_register, instructions)
    }

    #[inline] pub fn ip_register(&self) -> usize { self.ip_register }
    #[inline] pub fn len(&self) -> usize { self.instructions.len() }
    #[inline] pub fn instructions(&self) -> &[Instruction] { &self.instructions }

    /// The instruction at `addr`, or `None` when `addr` is outside the program.
    pub fn fetch(&self, addr: Word) -> Option<&Instruction> {
        usize::try_from(addr).ok().and_then(|i| self.instructions.get(i))
    }

    /// Same program with one instruction replaced. Used to derive variants
    /// of a bundled listing.
    pub fn with_instruction(&self, addr: usize, instr: Instruction) -> Result<Self, ProgramError> {
        let mut instructions = self.instructions.clone();
        if let Some(slot) = instructions.get_mut(addr) {
            *slot = instr;
        }
        Program::new(self.ip_register as Word, instructions)
    }
}

// prints back in the loader's text format
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#ip {}", self.ip_register)?;
        for instr in &self.instructions {
            writeln!(f, "{instr}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elfcode::opcode::Opcode;

    #[test]
    fn rejects_bad_ip_register() {
        let err = Program::new(6, vec![]).unwrap_err();
        assert_eq!(err, ProgramError::IpRegisterOutOfRange(6));
    }

    #[test]
    fn rejects_bad_destination_and_sources() {
        let err = Program::from_tuples(0, &[("seti", 1, 0, 1), ("addr", 0, 9, 2)]).unwrap_err();
        assert_eq!(err, ProgramError::InvalidRegister { index: 1, operand: 'b', register: 9 });

        let err = Program::from_tuples(0, &[("seti", 1, 0, 6)]).unwrap_err();
        assert_eq!(err, ProgramError::InvalidRegister { index: 0, operand: 'c', register: 6 });

        let err = Program::from_tuples(0, &[("setr", -1, 0, 2)]).unwrap_err();
        assert_eq!(err, ProgramError::InvalidRegister { index: 0, operand: 'a', register: -1 });
    }

    #[test]
    fn immediates_are_not_register_checked() {
        let p = Program::from_tuples(2, &[("seti", 10_678_677, 3, 5), ("gtir", 256, 1, 4)]).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.fetch(1).map(|i| i.op), Some(Opcode::Gtir));
        assert!(p.fetch(2).is_none());
        assert!(p.fetch(-1).is_none());
    }

    #[test]
    fn unknown_opcode_name() {
        let err = Program::from_tuples(0, &[("divr", 0, 0, 0)]).unwrap_err();
        assert_eq!(err, ProgramError::UnknownOpcode("divr".into()));
    }

    #[test]
    fn display_uses_text_format() {
        let p = Program::from_tuples(1, &[("seti", 5, 0, 1)]).unwrap();
        assert_eq!(p.to_string(), "#ip 1\nseti 5 0 1\n");
    }
}
