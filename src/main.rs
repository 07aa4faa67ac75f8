mod elfcode;

use std::process::ExitCode;

use argh::FromArgs;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use elfcode::asm::{self, AsmError};
use elfcode::errors::{ExecError, InferenceError, ProbeError};
use elfcode::exec::{self, ExecutionState, Limits};
use elfcode::mixer::{self, HaltProbe, MixParams};
use elfcode::{Program, RegisterFile, disasm, programs, samples};

/// Run and inspect ElfCode programs.
#[derive(FromArgs)]
struct Arguments {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Run(RunArgs),
    Cycles(CyclesArgs),
    Disasm(DisasmArgs),
    Infer(InferArgs),
}

/// run a program until the instruction pointer leaves it
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunArgs {
    /// listing file, or one of the bundled `day19`, `day19-example`, `day21`
    #[argh(positional)]
    program: String,

    /// initial registers, comma separated; missing ones start at 0
    #[argh(option, short = 'r', default = "String::new()")]
    registers: String,

    /// register to report once halted
    #[argh(option, default = "0")]
    result: usize,

    /// fail after this many executed instructions
    #[argh(option)]
    max_steps: Option<u64>,

    /// print every executed instruction
    #[argh(switch)]
    trace: bool,
}

/// report the first value and the last value before a repeat of a mixing routine
#[derive(FromArgs)]
#[argh(subcommand, name = "cycles")]
struct CyclesArgs {
    /// listing file, or one of the bundled listings
    #[argh(positional)]
    program: String,

    /// evaluate the routine's arithmetic directly instead of running the program
    #[argh(switch)]
    pure: bool,

    /// stop after the first produced value
    #[argh(switch)]
    first_only: bool,

    /// fail after this many executed instructions (or produced values with --pure)
    #[argh(option)]
    max_steps: Option<u64>,
}

/// print a listing as pseudo-code with jumps resolved
#[derive(FromArgs)]
#[argh(subcommand, name = "disasm")]
struct DisasmArgs {
    /// listing file, or one of the bundled listings
    #[argh(positional)]
    program: String,
}

/// recover opcode numbers from before/after samples and run the numbered program
#[derive(FromArgs)]
#[argh(subcommand, name = "infer")]
struct InferArgs {
    /// samples file, optionally followed by a numbered listing
    #[argh(positional)]
    samples: String,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("{path}: {source}")]
    Asm { path: String, source: AsmError },
    #[error("invalid register list `{0}`")]
    Registers(String),
    #[error("register {0} does not exist")]
    ResultRegister(usize),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

fn read(path: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_string(), source })
}

fn load_program(name: &str) -> Result<Program, CliError> {
    let text = match name {
        "day19" => programs::DAY19.to_string(),
        "day19-example" => programs::DAY19_EXAMPLE.to_string(),
        "day21" => programs::DAY21.to_string(),
        path => read(path)?,
    };
    asm::load(&text).map_err(|source| CliError::Asm { path: name.to_string(), source })
}

fn parse_registers(s: &str) -> Result<RegisterFile, CliError> {
    if s.trim().is_empty() {
        return Ok(RegisterFile::default());
    }
    let values = s
        .split(',')
        .map(|t| t.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| CliError::Registers(s.to_string()))?;
    RegisterFile::from_slice(&values).ok_or_else(|| CliError::Registers(s.to_string()))
}

fn limits(max_steps: Option<u64>) -> Limits {
    Limits { max_steps }
}

fn run(args: RunArgs) -> Result<(), CliError> {
    let program = load_program(&args.program)?;
    if !RegisterFile::is_valid(args.result as i64) {
        return Err(CliError::ResultRegister(args.result));
    }
    let mut state = ExecutionState::new(&program, parse_registers(&args.registers)?);
    let regs = if args.trace {
        for entry in exec::trace(&mut state, &program, limits(args.max_steps))? {
            println!("{entry}");
        }
        state.registers
    } else {
        exec::run_to_halt(&mut state, &program, limits(args.max_steps))?
    };
    tracing::info!(steps = state.steps(), registers = %regs, "halted");
    println!("{}", regs[args.result]);
    Ok(())
}

fn cycles(args: CyclesArgs) -> Result<(), CliError> {
    let program = load_program(&args.program)?;
    if args.first_only {
        let first = if args.pure {
            MixParams::from_program(&program)?.next(0)
        } else {
            mixer::first_value(&program, HaltProbe::find(&program, 0)?, limits(args.max_steps))?
        };
        println!("{first}");
        return Ok(());
    }
    let bounds = if args.pure {
        MixParams::from_program(&program)?.bounds(limits(args.max_steps))?
    } else {
        let probe = HaltProbe::find(&program, 0)?;
        tracing::info!(address = probe.address, register = probe.register, "watching comparison");
        mixer::find_bounds(&program, probe, limits(args.max_steps))?
    };
    println!("{}", bounds.first);
    println!("{}", bounds.last_novel);
    Ok(())
}

fn infer(args: InferArgs) -> Result<(), CliError> {
    let input = samples::parse(&read(&args.samples)?)?;
    println!("{}", samples::count_ambiguous(&input.samples, 3));
    if input.program.is_empty() {
        return Ok(());
    }
    let table = samples::resolve(&input.samples)?;
    for (n, op) in &table.0 {
        tracing::info!(number = n, opcode = %op, "resolved");
    }
    let instructions = table.decode(&input.program)?;
    let regs = exec::run_straight_line(RegisterFile::default(), &instructions);
    println!("{}", regs[0]);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let arguments: Arguments = argh::from_env();
    let result = match arguments.command {
        Command::Run(args) => run(args),
        Command::Cycles(args) => cycles(args),
        Command::Disasm(args) => load_program(&args.program).map(|p| println!("{}", disasm::disassemble(&p))),
        Command::Infer(args) => infer(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
