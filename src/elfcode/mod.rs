pub mod errors;
pub mod exec;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod registers;

pub mod asm;
pub mod disasm;

pub mod cycle;
pub mod mixer;
pub mod programs;
pub mod samples;

pub use exec::{ExecutionState, Limits, Outcome};
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use program::Program;
pub use registers::RegisterFile;
