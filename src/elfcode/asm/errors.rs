use thiserror::Error;

use crate::elfcode::errors::ProgramError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmErrorKind {
    #[error("expected `#ip <register>` before the first instruction")]
    MissingIpDirective,

    #[error("invalid `#ip` directive: {0}")]
    BadIpDirective(String),

    #[error("expected `opcode a b c`, got {0} fields")]
    FieldCount(usize),

    #[error("invalid integer: {0}")]
    BadInteger(String),

    #[error(transparent)]
    Program(#[from] ProgramError),
}

/// Loader error tied to a source line (0-based internally, printed 1-based).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {}: {kind}", .line + 1)]
pub struct AsmError {
    pub line: usize,
    pub kind: AsmErrorKind,
}

impl AsmError {
    pub fn new(line: usize, kind: impl Into<AsmErrorKind>) -> Self {
        AsmError { line, kind: kind.into() }
    }
}
