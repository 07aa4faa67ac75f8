// elfcode/exec.rs
use std::fmt;
use std::ops::ControlFlow;

use super::errors::ExecError;
use super::instruction::Instruction;
use super::program::Program;
use super::registers::{RegisterFile, Word};

/// Optional ceiling on executed instructions. `None` runs until halt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_steps: Option<u64>,
}

impl Limits {
    pub const UNBOUNDED: Limits = Limits { max_steps: None };

    pub fn steps(max_steps: u64) -> Self {
        Limits { max_steps: Some(max_steps) }
    }
}

/// Registers plus bookkeeping for one run. Owned by whoever drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionState {
    pub registers: RegisterFile,
    ip_register: usize,
    halted: bool,
    steps: u64,
}

impl ExecutionState {
    pub fn new(program: &Program, registers: RegisterFile) -> Self {
        ExecutionState {
            registers,
            ip_register: program.ip_register(),
            halted: false,
            steps: 0,
        }
    }

    /// Address of the next instruction to execute.
    #[inline] pub fn ip(&self) -> Word { self.registers.read(self.ip_register) }
    #[inline] pub fn halted(&self) -> bool { self.halted }
    /// Instructions executed so far.
    #[inline] pub fn steps(&self) -> u64 { self.steps }
}

/// How a run ended: the program left its address range, or the observer
/// asked to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Halted(RegisterFile),
    Stopped(T),
}

/// One executed instruction. `after` is sampled before the IP increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub ip: Word,
    pub before: RegisterFile,
    pub instruction: Instruction,
    pub after: RegisterFile,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ip={} {} {} {}", self.ip, self.before, self.instruction, self.after)
    }
}

fn step_traced(state: &mut ExecutionState, program: &Program) -> Option<TraceEntry> {
    if state.halted {
        return None;
    }
    let ip = state.ip();
    let Some(&instruction) = program.fetch(ip) else {
        state.halted = true;
        tracing::debug!(ip, steps = state.steps, "halted");
        return None;
    };
    let before = state.registers;
    tracing::trace!(ip, op = %instruction.op, "exec");

    instruction.execute(&mut state.registers);
    let after = state.registers;

    // after the write: an opcode that targeted the IP register jumps to value + 1
    let r = state.ip_register;
    state.registers.write(r, state.registers.read(r).wrapping_add(1));
    state.steps += 1;

    Some(TraceEntry { ip, before, instruction, after })
}

/// Executes one instruction. Returns `false` once the IP has left the
/// program, which is the only way a program halts.
pub fn step(state: &mut ExecutionState, program: &Program) -> bool {
    step_traced(state, program).is_some()
}

fn check_budget(state: &ExecutionState, program: &Program, limits: Limits) -> Result<(), ExecError> {
    match limits.max_steps {
        Some(max) if state.steps >= max && program.fetch(state.ip()).is_some() => {
            Err(ExecError::StepBudgetExceeded { steps: state.steps })
        }
        _ => Ok(()),
    }
}

/// Steps until halt and returns the final registers.
pub fn run_to_halt(state: &mut ExecutionState, program: &Program, limits: Limits) -> Result<RegisterFile, ExecError> {
    match run_with_observer(state, program, limits, |_| ControlFlow::<()>::Continue(()))? {
        Outcome::Halted(regs) => Ok(regs),
        Outcome::Stopped(()) => Ok(state.registers),
    }
}

/// Like [`run_to_halt`], but `observe` sees the state after every executed
/// instruction and may end the run with `ControlFlow::Break`.
pub fn run_with_observer<T, F>(
    state: &mut ExecutionState,
    program: &Program,
    limits: Limits,
    mut observe: F,
) -> Result<Outcome<T>, ExecError>
where
    F: FnMut(&ExecutionState) -> ControlFlow<T>,
{
    loop {
        check_budget(state, program, limits)?;
        if !step(state, program) {
            return Ok(Outcome::Halted(state.registers));
        }
        if let ControlFlow::Break(v) = observe(state) {
            tracing::debug!(steps = state.steps, ip = state.ip(), "observer stopped run");
            return Ok(Outcome::Stopped(v));
        }
    }
}

/// Runs to halt, recording every executed instruction.
pub fn trace(state: &mut ExecutionState, program: &Program, limits: Limits) -> Result<Vec<TraceEntry>, ExecError> {
    let mut entries = Vec::new();
    loop {
        check_budget(state, program, limits)?;
        match step_traced(state, program) {
            Some(entry) => entries.push(entry),
            None => return Ok(entries),
        }
    }
}

/// Executes each instruction once, in order, with no IP binding. For
/// numbered listings that carry no `#ip` directive.
pub fn run_straight_line(mut regs: RegisterFile, instructions: &[Instruction]) -> RegisterFile {
    for instr in instructions {
        instr.execute(&mut regs);
    }
    regs
}
