// elfcode/mixer.rs
//! Driving the self-comparing mixing routine to its cycle boundaries.
//!
//! The routine produces a value, compares it with the externally supplied
//! register 0 (`eqrr x 0 _`) and halts on a match. Instead of guessing
//! register 0 we watch the comparison and stop at the first repeated value.
use std::ops::ControlFlow;

use super::cycle::{CycleDetector, Signal};
use super::errors::{ExecError, ProbeError};
use super::exec::{ExecutionState, Limits, Outcome, run_with_observer};
use super::opcode::Opcode;
use super::program::Program;
use super::registers::{RegisterFile, Word};

/// Value that never equals a masked (non-negative) routine output.
const NEVER_MATCHES: Word = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBounds {
    pub first: Word,
    pub last_novel: Word,
}

/// The comparison instruction the routine halts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaltProbe {
    pub address: usize,
    /// Register holding the produced value.
    pub register: usize,
    /// Register the value is compared against.
    pub input_register: usize,
}

impl HaltProbe {
    pub fn find(program: &Program, input_register: usize) -> Result<Self, ProbeError> {
        let input = input_register as Word;
        let ip = program.ip_register() as Word;
        let candidates: Vec<HaltProbe> = program
            .instructions()
            .iter()
            .enumerate()
            .filter(|(_, i)| i.op == Opcode::Eqrr)
            .filter_map(|(address, i)| {
                let other = match (i.a == input, i.b == input) {
                    (true, false) => i.b,
                    (false, true) => i.a,
                    _ => return None,
                };
                (other != ip).then_some(HaltProbe { address, register: other as usize, input_register })
            })
            .collect();

        match candidates.as_slice() {
            [probe] => Ok(*probe),
            [] => Err(ProbeError::NotFound(input_register)),
            many => Err(ProbeError::Ambiguous { register: input_register, count: many.len() }),
        }
    }

    /// The produced value, if the state is about to execute the probe.
    #[inline]
    pub fn sample(&self, state: &ExecutionState) -> Option<Word> {
        (state.ip() == self.address as Word).then(|| state.registers[self.register])
    }

    fn initial_registers(&self) -> RegisterFile {
        let mut regs = RegisterFile::default();
        regs[self.input_register] = NEVER_MATCHES;
        regs
    }
}

/// First value the routine produces, by running the program itself.
pub fn first_value(program: &Program, probe: HaltProbe, limits: Limits) -> Result<Word, ProbeError> {
    let mut state = ExecutionState::new(program, probe.initial_registers());
    if let Some(v) = probe.sample(&state) {
        return Ok(v);
    }
    match run_with_observer(&mut state, program, limits, |s| match probe.sample(s) {
        Some(v) => ControlFlow::Break(v),
        None => ControlFlow::Continue(()),
    })? {
        Outcome::Stopped(v) => Ok(v),
        Outcome::Halted(_) => Err(ProbeError::Halted),
    }
}

/// Runs the program under a cycle detector until a produced value repeats.
pub fn find_bounds(program: &Program, probe: HaltProbe, limits: Limits) -> Result<CycleBounds, ProbeError> {
    let mut state = ExecutionState::new(program, probe.initial_registers());
    let mut detector = CycleDetector::new();

    // an IP already parked on the probe produces before anything runs
    if let Some(v) = probe.sample(&state) {
        if let Signal::FirstSeen(v) = detector.observe(v) {
            tracing::info!(first = v, "first value produced");
        }
    }
    let out = run_with_observer(&mut state, program, limits, |s| {
        let Some(v) = probe.sample(s) else {
            return ControlFlow::Continue(());
        };
        match detector.observe(v) {
            Signal::FirstSeen(v) => {
                tracing::info!(first = v, "first value produced");
                ControlFlow::Continue(())
            }
            Signal::Terminal(last) => ControlFlow::Break(last),
            Signal::Continue => ControlFlow::Continue(()),
        }
    })?;

    match (out, detector.first()) {
        (Outcome::Stopped(last_novel), Some(first)) => {
            tracing::info!(first, last_novel, distinct = detector.distinct(), steps = state.steps(), "cycle closed");
            Ok(CycleBounds { first, last_novel })
        }
        _ => Err(ProbeError::Halted),
    }
}

/// The routine's arithmetic as a pure function of the previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixParams {
    pub spread: Word,
    pub seed: Word,
    pub multiplier: Word,
    pub mask: Word,
    /// Mask applied to the low part of the spread value each round.
    pub byte_mask: Word,
    /// Divisor that shifts the spread value down; the loop ends below it.
    pub radix: Word,
}

impl MixParams {
    /// Pulls the constants out of the routine's immediates: the `bori`
    /// operand, the `seti` and `bani` right after it, the first `muli` and
    /// the `bani` that follows it, and the `gtir` loop bound.
    pub fn from_program(program: &Program) -> Result<Self, ProbeError> {
        let instrs = program.instructions();
        let bori = instrs
            .iter()
            .position(|i| i.op == Opcode::Bori)
            .ok_or(ProbeError::MissingConstant("bori"))?;
        let seed = instrs
            .get(bori + 1)
            .filter(|i| i.op == Opcode::Seti)
            .ok_or(ProbeError::MissingConstant("seti"))?;
        let byte_mask = instrs
            .get(bori + 2)
            .filter(|i| i.op == Opcode::Bani)
            .ok_or(ProbeError::MissingConstant("bani"))?;
        let muli = instrs
            .iter()
            .position(|i| i.op == Opcode::Muli)
            .ok_or(ProbeError::MissingConstant("muli"))?;
        let mask = instrs
            .get(muli + 1)
            .filter(|i| i.op == Opcode::Bani)
            .ok_or(ProbeError::MissingConstant("bani"))?;
        let radix = instrs
            .iter()
            .find(|i| i.op == Opcode::Gtir)
            .map(|i| i.a)
            .filter(|&r| r > 1)
            .ok_or(ProbeError::MissingConstant("gtir"))?;

        Ok(MixParams {
            spread: instrs[bori].b,
            seed: seed.a,
            multiplier: instrs[muli].b,
            mask: mask.b,
            byte_mask: byte_mask.b,
            radix,
        })
    }

    pub fn next(&self, value: Word) -> Word {
        let mut r1 = value | self.spread;
        let mut r5 = self.seed;
        loop {
            r5 = (((r5.wrapping_add(r1 & self.byte_mask)) & self.mask).wrapping_mul(self.multiplier)) & self.mask;
            if r1 < self.radix {
                return r5;
            }
            r1 /= self.radix;
        }
    }

    /// Cycle boundaries of the sequence `next(0), next(next(0)), ...`.
    /// `limits` caps the number of generated values.
    pub fn bounds(&self, limits: Limits) -> Result<CycleBounds, ExecError> {
        let mut detector = CycleDetector::new();
        let mut value = 0;
        let mut produced = 0u64;
        loop {
            if limits.max_steps.is_some_and(|max| produced >= max) {
                return Err(ExecError::StepBudgetExceeded { steps: produced });
            }
            value = self.next(value);
            produced += 1;
            if let Signal::Terminal(last_novel) = detector.observe(value) {
                // the first observe always returns FirstSeen, so first is set
                let first = detector.first().unwrap_or(last_novel);
                return Ok(CycleBounds { first, last_novel });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elfcode::instruction::Instruction;
    use crate::elfcode::programs::day21;

    fn small_mask_variant() -> Program {
        let p = day21().unwrap();
        let p = p.with_instruction(10, Instruction::new(Opcode::Bani, 5, 255, 5)).unwrap();
        p.with_instruction(12, Instruction::new(Opcode::Bani, 5, 255, 5)).unwrap()
    }

    #[test]
    fn probe_is_the_register0_comparison() {
        let probe = HaltProbe::find(&day21().unwrap(), 0).unwrap();
        assert_eq!(probe, HaltProbe { address: 28, register: 5, input_register: 0 });
    }

    #[test]
    fn probe_missing_or_ambiguous() {
        let p = Program::from_tuples(2, &[("seti", 1, 0, 1)]).unwrap();
        assert_eq!(HaltProbe::find(&p, 0), Err(ProbeError::NotFound(0)));
        let p = Program::from_tuples(2, &[("eqrr", 1, 0, 1), ("eqrr", 0, 3, 1)]).unwrap();
        assert_eq!(HaltProbe::find(&p, 0), Err(ProbeError::Ambiguous { register: 0, count: 2 }));
    }

    #[test]
    fn constants_come_from_the_program() {
        let params = MixParams::from_program(&day21().unwrap()).unwrap();
        assert_eq!(
            params,
            MixParams {
                spread: 65536,
                seed: 10_678_677,
                multiplier: 65899,
                mask: 16_777_215,
                byte_mask: 255,
                radix: 256,
            }
        );
    }

    #[test]
    fn missing_loop_bound_is_reported() {
        let p = day21().unwrap();
        let p = p.with_instruction(13, Instruction::new(Opcode::Gtri, 1, 256, 4)).unwrap();
        assert_eq!(MixParams::from_program(&p), Err(ProbeError::MissingConstant("gtir")));
    }

    #[test]
    fn first_value_matches_pure_routine() {
        let p = day21().unwrap();
        let probe = HaltProbe::find(&p, 0).unwrap();
        let vm = first_value(&p, probe, Limits::steps(10_000)).unwrap();
        let pure = MixParams::from_program(&p).unwrap().next(0);
        assert_eq!(vm, 12_935_354);
        assert_eq!(vm, pure);
    }

    #[test]
    fn pure_bounds_of_full_routine() {
        let params = MixParams::from_program(&day21().unwrap()).unwrap();
        let bounds = params.bounds(Limits::UNBOUNDED).unwrap();
        assert_eq!(bounds, CycleBounds { first: 12_935_354, last_novel: 12_390_302 });
    }

    #[test]
    fn vm_and_pure_agree_on_small_state_space() {
        let p = small_mask_variant();
        let probe = HaltProbe::find(&p, 0).unwrap();
        let vm = find_bounds(&p, probe, Limits::steps(1_000_000)).unwrap();
        let pure = MixParams::from_program(&p).unwrap().bounds(Limits::UNBOUNDED).unwrap();
        assert_eq!(vm, CycleBounds { first: 186, last_novel: 0 });
        assert_eq!(vm, pure);
    }

    #[test]
    fn bounds_respect_budget() {
        let p = day21().unwrap();
        let probe = HaltProbe::find(&p, 0).unwrap();
        let err = find_bounds(&p, probe, Limits::steps(5_000)).unwrap_err();
        assert_eq!(err, ProbeError::Exec(ExecError::StepBudgetExceeded { steps: 5_000 }));

        let params = MixParams::from_program(&p).unwrap();
        assert_eq!(params.bounds(Limits::steps(3)), Err(ExecError::StepBudgetExceeded { steps: 3 }));
    }

    #[test]
    #[ignore = "billions of VM steps; run in release"]
    fn vm_bounds_of_full_routine() {
        let p = day21().unwrap();
        let probe = HaltProbe::find(&p, 0).unwrap();
        let bounds = find_bounds(&p, probe, Limits::UNBOUNDED).unwrap();
        assert_eq!(bounds, CycleBounds { first: 12_935_354, last_novel: 12_390_302 });
    }
}
