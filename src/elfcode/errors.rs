use thiserror::Error;

use super::registers::Word;

/// Rejected while building a [`Program`](super::program::Program). Never
/// raised once execution has started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),

    /// A register-mode operand does not name one of the six registers.
    #[error("instruction {index}: operand {operand} = {register} is not a register")]
    InvalidRegister { index: usize, operand: char, register: Word },

    #[error("instruction pointer register {0} is out of range")]
    IpRegisterOutOfRange(Word),
}

/// Errors that can occur while running a program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("exceeded step budget after {steps} steps")]
    StepBudgetExceeded { steps: u64 },
}

/// Problems locating the mixing routine's probe or constants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("no eqrr instruction compares against register {0}")]
    NotFound(usize),

    #[error("{count} eqrr instructions compare against register {register}")]
    Ambiguous { register: usize, count: usize },

    #[error("mixing routine has no `{0}` instruction")]
    MissingConstant(&'static str),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("program halted before the probe was reached")]
    Halted,
}

/// Opcode-number inference from before/after samples.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error("opcode number {0} matches no opcode")]
    Contradiction(Word),

    #[error("opcode numbers {0:?} remain ambiguous")]
    Unresolved(Vec<Word>),

    #[error("opcode number {0} is not in the table")]
    UnknownNumber(Word),

    #[error(transparent)]
    Program(#[from] ProgramError),
}
