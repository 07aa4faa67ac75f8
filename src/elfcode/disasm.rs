// elfcode/disasm.rs
use super::instruction::Instruction;
use super::opcode::Opcode;
use super::program::Program;
use super::registers::Word;

/// Renders one instruction as pseudo-code. Writes to the IP register turn
/// into jumps; reads of it fold to the instruction's own address.
pub fn disasm(instr: &Instruction, addr: usize, ip: usize) -> String {
    let Instruction { op, a, b, c } = *instr;
    let ip = ip as Word;
    let n = addr as Word;
    use Opcode::*;
    match op {
        Addi if c == ip && a == ip => format!("jump #{}", b.wrapping_add(n + 1)),
        Addr if c == ip && a == ip => format!("jump r[{b}] + {}", n + 1),
        Addr if c == ip && b == ip => format!("jump r[{a}] + {}", n + 1),
        Seti if c == ip => format!("jump #{}", a.wrapping_add(1)),
        Mulr if a == ip && b == ip && c == ip => format!("jump #{}", n.wrapping_mul(n).wrapping_add(1)),
        Addr if b == ip => format!("r[{c}] = r[{a}] + {n}"),
        Addr if a == ip => format!("r[{c}] = r[{b}] + {n}"),
        Mulr if b == ip => format!("r[{c}] = r[{a}] * {n}"),
        Mulr if a == ip => format!("r[{c}] = r[{b}] * {n}"),
        Setr if a == ip => format!("r[{c}] = {n}"),

        Addr => format!("r[{c}] = r[{a}] + r[{b}]"),
        Addi => format!("r[{c}] = r[{a}] + {b}"),
        Mulr => format!("r[{c}] = r[{a}] * r[{b}]"),
        Muli => format!("r[{c}] = r[{a}] * 0x{b:08x}"),
        Banr => format!("r[{c}] = r[{a}] & r[{b}]"),
        Bani => format!("r[{c}] = r[{a}] & 0x{b:08x}"),
        Borr => format!("r[{c}] = r[{a}] | r[{b}]"),
        Bori => format!("r[{c}] = r[{a}] | 0x{b:08x}"),
        Setr => format!("r[{c}] = r[{a}]"),
        Seti => format!("r[{c}] = 0x{a:08x}"),
        Gtir => format!("r[{c}] = 1 if 0x{a:08x} > r[{b}] else 0"),
        Gtri => format!("r[{c}] = 1 if r[{a}] > 0x{b:08x} else 0"),
        Gtrr => format!("r[{c}] = 1 if r[{a}] > r[{b}] else 0"),
        Eqir => format!("r[{c}] = 1 if 0x{a:08x} == r[{b}] else 0"),
        Eqri => format!("r[{c}] = 1 if r[{a}] == 0x{b:08x} else 0"),
        Eqrr => format!("r[{c}] = 1 if r[{a}] == r[{b}] else 0"),
    }
}

/// Whole listing, one `NN# text` line per instruction.
pub fn disassemble(program: &Program) -> String {
    program
        .instructions()
        .iter()
        .enumerate()
        .map(|(addr, i)| format!("{addr:2}# {}", disasm(i, addr, program.ip_register())))
        .collect::<Vec<_>>()
        .join("\n")
}
