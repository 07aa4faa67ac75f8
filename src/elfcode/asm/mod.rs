// src/elfcode/asm/mod.rs
//! Text loader for ElfCode listings:
//!
//! ```text
//! #ip 2
//! seti 123 0 5   ; comment
//! bani 5 456 5
//! ```
mod errors;

pub use errors::{AsmError, AsmErrorKind};

use crate::elfcode::errors::ProgramError;
use crate::elfcode::instruction::Instruction;
use crate::elfcode::opcode::Opcode;
use crate::elfcode::program::Program;
use crate::elfcode::registers::Word;

// ---------- API ----------
pub fn load(text: &str) -> Result<Program, AsmError> {
    let lines = preprocess(text);
    let mut lines = lines.into_iter();

    let (first_line, directive) = lines
        .next()
        .ok_or_else(|| AsmError::new(0, AsmErrorKind::MissingIpDirective))?;
    let ip = parse_ip_directive(&directive).map_err(|k| AsmError::new(first_line, k))?;

    let mut instructions = Vec::new();
    for (line, raw) in lines {
        let instr = parse_instr(&raw).map_err(|k| AsmError::new(line, k))?;
        instr.validate(instructions.len()).map_err(|e| AsmError::new(line, e))?;
        instructions.push(instr);
    }

    Program::new(ip, instructions).map_err(|e| AsmError::new(first_line, e))
}

// ---------- Internals ----------
fn preprocess(text: &str) -> Vec<(usize, String)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| {
            let l = l.split(';').next().unwrap_or(l);
            let l = l.split("//").next().unwrap_or(l);
            (i, l.trim().to_string())
        })
        .filter(|(_, l)| !l.is_empty())
        .collect()
}

fn parse_ip_directive(s: &str) -> Result<Word, AsmErrorKind> {
    let rest = s.strip_prefix("#ip").ok_or(AsmErrorKind::MissingIpDirective)?;
    let reg = rest.trim();
    let ip = parse_int(reg).map_err(|_| AsmErrorKind::BadIpDirective(reg.to_string()))?;
    if !(0..6).contains(&ip) {
        return Err(ProgramError::IpRegisterOutOfRange(ip).into());
    }
    Ok(ip)
}

fn parse_instr(s: &str) -> Result<Instruction, AsmErrorKind> {
    // ex: "addi 2 16 2"
    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() != 4 {
        return Err(AsmErrorKind::FieldCount(parts.len()));
    }
    let op: Opcode = parts[0].to_lowercase().parse()?;
    let a = parse_int(parts[1])?;
    let b = parse_int(parts[2])?;
    let c = parse_int(parts[3])?;
    Ok(Instruction::new(op, a, b, c))
}

/// Four integer fields, as in numbered listings.
pub(crate) fn parse_fields(s: &str) -> Result<[Word; 4], AsmErrorKind> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() != 4 {
        return Err(AsmErrorKind::FieldCount(parts.len()));
    }
    let mut out = [0; 4];
    for (slot, p) in out.iter_mut().zip(&parts) {
        *slot = parse_int(p)?;
    }
    Ok(out)
}

pub(crate) fn parse_int(s: &str) -> Result<Word, AsmErrorKind> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x") {
        Word::from_str_radix(hex, 16)
    } else {
        s.parse::<Word>()
    };
    parsed.map_err(|_| AsmErrorKind::BadInteger(s.to_string()))
}
