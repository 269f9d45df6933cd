use clap::Parser;
use rv32i_vm::decoder::Register;
use rv32i_vm::loader;
use rv32i_vm::{Emulator, RunExit, VmConfig};
use std::path::PathBuf;

/// Program run when neither `--program` nor `--word` is given.
const DEMO_PROGRAM: [u32; 4] = [
    0x00000013, // addi x0, x0, 0
    0x00500113, // addi x2, x0, 5
    0x00600193, // addi x3, x0, 6
    0x003101B3, // add x3, x2, x3
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Program image: hex text (one word per line) or raw little-endian binary
    #[arg(short, long, conflicts_with = "word")]
    program: Option<PathBuf>,

    /// Inline instruction word in hex (repeatable)
    #[arg(short, long)]
    word: Vec<String>,

    /// Instruction memory size in 32-bit words
    #[arg(long, default_value_t = rv32i_vm::config::DEFAULT_MEMORY_WORDS)]
    mem_words: usize,

    /// Hardwire x0 to zero (strict RV32I)
    #[arg(long)]
    hardwire_x0: bool,

    /// Compute the JALR target from rs1 before writing the link register
    #[arg(long)]
    jalr_reads_rs1_first: bool,

    /// Stop after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Register whose final value is printed
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..32))]
    reg: u32,

    /// Print all 32 registers after the run
    #[arg(long)]
    dump_regs: bool,

    /// Write a bincode snapshot of the final state to this path
    #[arg(long)]
    snapshot_out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let program = if let Some(path) = &args.program {
        loader::load_program_file(path)?
    } else if !args.word.is_empty() {
        loader::parse_text(&args.word.join("\n"))?
    } else {
        DEMO_PROGRAM.to_vec()
    };

    let config = VmConfig::default()
        .with_memory_words(args.mem_words)
        .with_hardwired_x0(args.hardwire_x0)
        .with_jalr_reads_rs1_first(args.jalr_reads_rs1_first);
    let mut emu = Emulator::new(config);
    emu.load_program(&program)?;

    match args.max_steps {
        Some(limit) => {
            if emu.run_with_limit(limit) == RunExit::StepLimit {
                eprintln!("Stopped after {} steps at pc={:#x}", limit, emu.pc());
            }
        }
        None => {
            emu.run();
        }
    }

    let reg = Register::from_u32(args.reg);
    println!("Result in {}: {}", reg, emu.register(reg));

    if args.dump_regs {
        dump_registers(&emu);
    }

    if let Some(path) = &args.snapshot_out {
        let bytes = emu.snapshot().to_bytes()?;
        std::fs::write(path, bytes)?;
        println!("Snapshot written to {}", path.display());
    }

    Ok(())
}

fn dump_registers(emu: &Emulator) {
    let stats = emu.stats();
    println!(
        "pc={:#x} cycles={} executed={} ignored={}",
        emu.pc(),
        stats.cycles,
        stats.executed,
        stats.ignored
    );
    for row in 0..8u32 {
        let line: Vec<String> = (0..4u32)
            .map(|col| {
                let reg = Register::from_u32(row + col * 8);
                format!("{:>4}={:#010x}", reg.to_string(), emu.register(reg))
            })
            .collect();
        println!("{}", line.join("  "));
    }
}
