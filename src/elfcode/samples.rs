// elfcode/samples.rs
//! Recovering opcode numbers from before/after register samples.
//!
//! ```text
//! Before: [3, 2, 1, 1]
//! 9 2 1 2
//! After:  [3, 2, 2, 1]
//! ```
use std::collections::{BTreeMap, BTreeSet};

use super::asm::{parse_fields, parse_int};
use super::errors::InferenceError;
use super::instruction::Instruction;
use super::opcode::Opcode;
use super::registers::{RegisterFile, Word};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub before: RegisterFile,
    /// `[number, a, b, c]`
    pub instruction: [Word; 4],
    pub after: RegisterFile,
    /// Registers actually listed; the rest are zero padding.
    pub width: usize,
}

/// Samples plus the numbered listing that follows them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleInput {
    pub samples: Vec<Sample>,
    pub program: Vec<[Word; 4]>,
}

fn parse_err(line: usize, msg: impl Into<String>) -> InferenceError {
    InferenceError::Parse { line: line + 1, msg: msg.into() }
}

fn parse_regs(line: usize, s: &str, label: &str) -> Result<(RegisterFile, usize), InferenceError> {
    let body = s
        .strip_prefix(label)
        .map(str::trim)
        .and_then(|r| r.strip_prefix('['))
        .and_then(|r| r.strip_suffix(']'))
        .ok_or_else(|| parse_err(line, format!("expected `{label} [..]`")))?;
    let values = body
        .split(',')
        .map(|t| parse_int(t).map_err(|e| parse_err(line, e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    let regs = RegisterFile::from_slice(&values).ok_or_else(|| parse_err(line, "more than six registers"))?;
    Ok((regs, values.len()))
}

fn parse_row(line: usize, s: &str) -> Result<[Word; 4], InferenceError> {
    parse_fields(s).map_err(|e| parse_err(line, e.to_string()))
}

pub fn parse(text: &str) -> Result<SampleInput, InferenceError> {
    let mut input = SampleInput::default();
    let mut lines = text.lines().enumerate().map(|(i, l)| (i, l.trim()));
    while let Some((i, line)) = lines.next() {
        if line.is_empty() {
            continue;
        }
        if line.starts_with("Before:") {
            let (before, width) = parse_regs(i, line, "Before:")?;
            let (j, row) = lines.next().ok_or_else(|| parse_err(i, "sample ends early"))?;
            let instruction = parse_row(j, row)?;
            let (k, after) = lines.next().ok_or_else(|| parse_err(j, "sample ends early"))?;
            let (after, after_width) = parse_regs(k, after, "After:")?;
            if after_width != width {
                return Err(parse_err(k, format!("expected {width} registers, got {after_width}")));
            }
            input.samples.push(Sample { before, instruction, after, width });
        } else {
            input.program.push(parse_row(i, line)?);
        }
    }
    Ok(input)
}

/// Opcodes whose execution turns `before` into `after`. Register operands
/// must fall inside the sample's listed registers.
pub fn compatible(sample: &Sample) -> Vec<Opcode> {
    let [_, a, b, c] = sample.instruction;
    let listed = |r: Word| (0..sample.width as Word).contains(&r);
    if !listed(c) {
        return Vec::new();
    }
    Opcode::ALL
        .into_iter()
        .filter(|op| op.operands_valid(a, b, sample.width))
        .filter(|op| {
            let mut regs = sample.before;
            op.execute(&mut regs, a, b, c as usize);
            regs == sample.after
        })
        .collect()
}

/// Samples that behave like at least `threshold` opcodes.
pub fn count_ambiguous(samples: &[Sample], threshold: usize) -> usize {
    samples.iter().filter(|s| compatible(s).len() >= threshold).count()
}

/// Opcode number to opcode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpcodeTable(pub BTreeMap<Word, Opcode>);

impl OpcodeTable {
    pub fn get(&self, number: Word) -> Option<Opcode> { self.0.get(&number).copied() }

    pub fn decode(&self, rows: &[[Word; 4]]) -> Result<Vec<Instruction>, InferenceError> {
        rows.iter()
            .enumerate()
            .map(|(i, &[n, a, b, c])| -> Result<Instruction, InferenceError> {
                let op = self.get(n).ok_or(InferenceError::UnknownNumber(n))?;
                let instr = Instruction::new(op, a, b, c);
                instr.validate(i)?;
                Ok(instr)
            })
            .collect()
    }
}

/// Narrows each number to the opcodes consistent with all of its samples,
/// then pins numbers with a single candidate until nothing changes.
pub fn resolve(samples: &[Sample]) -> Result<OpcodeTable, InferenceError> {
    let mut candidates: BTreeMap<Word, BTreeSet<Opcode>> = BTreeMap::new();
    for s in samples {
        let n = s.instruction[0];
        let ok: BTreeSet<Opcode> = compatible(s).into_iter().collect();
        let entry = candidates.entry(n).or_insert_with(|| ok.clone());
        entry.retain(|op| ok.contains(op));
        if entry.is_empty() {
            return Err(InferenceError::Contradiction(n));
        }
    }

    let mut table = BTreeMap::new();
    loop {
        let pinned: Vec<(Word, Opcode)> = candidates
            .iter()
            .filter(|(n, ops)| ops.len() == 1 && !table.contains_key(*n))
            .filter_map(|(&n, ops)| ops.first().map(|&op| (n, op)))
            .collect();
        if pinned.is_empty() {
            break;
        }
        for (n, op) in pinned {
            table.insert(n, op);
            for (&m, ops) in candidates.iter_mut() {
                if m != n {
                    ops.remove(&op);
                    if ops.is_empty() {
                        return Err(InferenceError::Contradiction(m));
                    }
                }
            }
        }
    }

    let unresolved: Vec<Word> = candidates.keys().filter(|n| !table.contains_key(*n)).copied().collect();
    if !unresolved.is_empty() {
        return Err(InferenceError::Unresolved(unresolved));
    }
    tracing::debug!(resolved = table.len(), "opcode numbers resolved");
    Ok(OpcodeTable(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elfcode::exec::run_straight_line;

    const CANONICAL: &str = "Before: [3, 2, 1, 1]\n9 2 1 2\nAfter:  [3, 2, 2, 1]\n";

    fn truth(n: Word) -> Opcode {
        Opcode::ALL[((n * 5 + 3) % 16) as usize]
    }

    fn synthesized() -> Vec<Sample> {
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = |m: u64| {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            ((seed >> 33) % m) as Word
        };
        let mut samples = Vec::new();
        for _ in 0..16 {
            for n in 0..16 {
                let before = RegisterFile([next(16), next(16), next(16), next(16), 0, 0]);
                let (a, b, c) = (next(4), next(4), next(4));
                let mut after = before;
                truth(n).execute(&mut after, a, b, c as usize);
                samples.push(Sample { before, instruction: [n, a, b, c], after, width: 4 });
            }
        }
        samples
    }

    #[test]
    fn canonical_sample_matches_three_opcodes() {
        let input = parse(CANONICAL).unwrap();
        assert_eq!(input.samples[0].before, RegisterFile([3, 2, 1, 1, 0, 0]));
        assert_eq!(compatible(&input.samples[0]), vec![Opcode::Addi, Opcode::Mulr, Opcode::Seti]);
        assert_eq!(count_ambiguous(&input.samples, 3), 1);
        assert_eq!(count_ambiguous(&input.samples, 4), 0);
    }

    #[test]
    fn parses_samples_then_program() {
        let text = format!("{CANONICAL}\n{CANONICAL}\n\n\n9 0 7 1\n9 1 0 2\n");
        let input = parse(&text).unwrap();
        assert_eq!(input.samples.len(), 2);
        assert_eq!(input.program, vec![[9, 0, 7, 1], [9, 1, 0, 2]]);
    }

    #[test]
    fn malformed_sample_reports_line() {
        let err = parse("Before: [3, 2, 1, 1]\n9 2 1\nAfter:  [3, 2, 2, 1]\n").unwrap_err();
        assert_eq!(err, InferenceError::Parse { line: 2, msg: "expected `opcode a b c`, got 3 fields".into() });
    }

    #[test]
    fn resolves_synthesized_numbering() {
        let table = resolve(&synthesized()).unwrap();
        for n in 0..16 {
            assert_eq!(table.get(n), Some(truth(n)), "number {n}");
        }
    }

    #[test]
    fn decoded_program_runs_straight_line() {
        let table = resolve(&synthesized()).unwrap();
        let number = |op: Opcode| (0..16).find(|&n| truth(n) == op).unwrap();
        let rows = [
            [number(Opcode::Seti), 7, 0, 1],
            [number(Opcode::Muli), 1, 6, 2],
            [number(Opcode::Addr), 1, 2, 0],
        ];
        let instrs = table.decode(&rows).unwrap();
        let regs = run_straight_line(RegisterFile::default(), &instrs);
        assert_eq!(regs.0, [49, 7, 42, 0, 0, 0]);
        assert_eq!(table.decode(&[[99, 0, 0, 0]]), Err(InferenceError::UnknownNumber(99)));
    }

    #[test]
    fn padding_registers_are_not_operands() {
        // register 4 is padding, so only eqir (4 == r0 -> 0) fits
        let input = parse("Before: [0, 0, 0, 0]\n8 4 0 0\nAfter:  [0, 0, 0, 0]\n").unwrap();
        assert_eq!(input.samples[0].width, 4);
        assert_eq!(compatible(&input.samples[0]), vec![Opcode::Eqir]);
    }

    #[test]
    fn mismatched_sample_widths_are_rejected() {
        let err = parse("Before: [0, 0, 0, 0]\n8 1 0 0\nAfter:  [0, 0, 0, 0, 0, 0]\n").unwrap_err();
        assert_eq!(err, InferenceError::Parse { line: 3, msg: "expected 4 registers, got 6".into() });
    }

    #[test]
    fn single_sample_is_unresolved() {
        let input = parse(CANONICAL).unwrap();
        assert_eq!(resolve(&input.samples), Err(InferenceError::Unresolved(vec![9])));
    }

    #[test]
    fn impossible_sample_is_a_contradiction() {
        let input = parse("Before: [0, 0, 0, 0]\n4 0 0 0\nAfter:  [0, 0, 0, 9]\n").unwrap();
        assert_eq!(resolve(&input.samples), Err(InferenceError::Contradiction(4)));
    }
}
