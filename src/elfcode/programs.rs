//! Listings bundled with the crate.
use super::asm::{AsmError, load};
use super::program::Program;

pub const DAY19_EXAMPLE: &str = include_str!("../../data/day19_example.txt");
pub const DAY19: &str = include_str!("../../data/day19.txt");
/// Mixing routine: halts once the value it produces equals register 0.
pub const DAY21: &str = include_str!("../../data/day21.txt");

pub fn day19_example() -> Result<Program, AsmError> { load(DAY19_EXAMPLE) }
pub fn day19() -> Result<Program, AsmError> { load(DAY19) }
pub fn day21() -> Result<Program, AsmError> { load(DAY21) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elfcode::exec::{ExecutionState, Limits, run_to_halt};
    use crate::elfcode::registers::RegisterFile;

    fn run(p: &Program, regs: RegisterFile) -> RegisterFile {
        let mut st = ExecutionState::new(p, regs);
        run_to_halt(&mut st, p, Limits::steps(20_000_000)).expect("halts")
    }

    #[test]
    fn bundled_listings_load() {
        assert_eq!(day19_example().unwrap().len(), 7);
        assert_eq!(day19().unwrap().len(), 36);
        assert_eq!(day21().unwrap().len(), 31);
    }

    #[test]
    fn day19_from_zero_is_deterministic() {
        let p = day19().unwrap();
        let first = run(&p, RegisterFile::default());
        let second = run(&p, RegisterFile::default());
        assert_eq!(first[0], 1488);
        assert_eq!(first, second);
        assert_eq!(first.0, [1488, 915, 257, 916, 1, 916]);
    }

    #[test]
    fn day19_variant_one_replays_identically() {
        // register 0 = 1 selects the long variant; compare a fixed prefix of two runs
        use crate::elfcode::exec::{Outcome, run_with_observer};
        use std::ops::ControlFlow;

        let p = day19().unwrap();
        let prefix = || {
            let mut st = ExecutionState::new(&p, RegisterFile([1, 0, 0, 0, 0, 0]));
            let out = run_with_observer(&mut st, &p, Limits::UNBOUNDED, |s| {
                if s.steps() == 1_000_000 { ControlFlow::Break(s.registers) } else { ControlFlow::Continue(()) }
            });
            match out {
                Ok(Outcome::Stopped(regs)) => regs,
                other => panic!("unexpected {other:?}"),
            }
        };
        let a = prefix();
        assert_eq!(a, prefix());
        // setup phase has loaded the large target into r1
        assert_eq!(a[1], 10_551_315);
    }

    #[test]
    fn day21_halts_when_register0_matches_first_value() {
        let p = day21().unwrap();
        let mut st = ExecutionState::new(&p, RegisterFile([12_935_354, 0, 0, 0, 0, 0]));
        run_to_halt(&mut st, &p, Limits::steps(10_000)).expect("halts");
        assert_eq!(st.steps(), 1848);
        assert_eq!(st.registers[5], 12_935_354);
    }
}
