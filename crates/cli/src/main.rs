mod bios;
mod error;
mod loader;

use anyhow::{Context, Result};
use clap::Parser;
use emu_core::logging::{LogConfig, LogLevel};
use emu_core::{Cpu8080, FlatMemory, StepResult};
use std::path::PathBuf;

/// Run one or more 8080 binary images against the core.
///
/// ROMs are concatenated into a single 64 KiB address space in the order
/// given, starting at `--offset`; execution begins at that same address.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// ROM image(s) to load, in order, starting at --offset.
    roms: Vec<PathBuf>,

    /// Load address / start address. Accepts decimal, or 0x/0o/0b prefixed
    /// hex/octal/binary, same as the original tool's getopt-based parsing.
    #[arg(short, long, default_value = "0", value_parser = parse_offset)]
    offset: u16,

    /// Stop after this many instructions even if the program hasn't
    /// halted or reset. 0 means run until HLT or a PC wrap to 0x0000.
    #[arg(long, default_value_t = 0)]
    max_steps: u64,

    /// Run the CP/M BDOS print shim (function 2 and 9 at 0x0005),
    /// useful for classic 8080 instruction exercisers.
    #[arg(long, default_value_t = false)]
    cpm: bool,

    /// Suppress the final register dump.
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Print a JSON snapshot of architectural state (registers, flags,
    /// PC/SP, IE) after the run, for debugging or test fixtures. Memory
    /// contents are not included.
    #[arg(long, default_value_t = false)]
    dump_state: bool,

    /// Core log level: off, error, warn, info, debug, trace.
    #[arg(long, default_value = "off")]
    log_level: String,
}

fn parse_offset(s: &str) -> Result<u16, String> {
    let (digits, radix) = if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (rest, 2)
    } else {
        (s, 10)
    };
    u16::from_str_radix(digits, radix).map_err(|e| format!("invalid offset {s:?}: {e}"))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let level = LogLevel::from_str(&args.log_level)
        .with_context(|| format!("invalid --log-level {:?}", args.log_level))?;
    LogConfig::global().set_global_level(level);

    if args.roms.is_empty() {
        anyhow::bail!("no ROM image given; pass at least one path");
    }

    let mut memory = FlatMemory::new();
    let mut addr = args.offset;
    for rom in &args.roms {
        let n = loader::load_rom(rom, &mut memory, addr)
            .with_context(|| format!("loading {}", rom.display()))?;
        log::info!("loaded {} ({} bytes at {:#06x})", rom.display(), n, addr);
        addr = addr.wrapping_add(n as u16);
    }

    let mut cpu = Cpu8080::new(memory);
    cpu.pc = args.offset;
    if args.cpm {
        bios::install(&mut cpu);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut steps = 0u64;
    loop {
        if args.cpm {
            bios::intercept(&cpu, &mut out);
        }

        match cpu.step() {
            StepResult::Continue => {}
            StepResult::Halted => break,
            StepResult::Reset => break,
        }

        steps += 1;
        if args.max_steps != 0 && steps >= args.max_steps {
            break;
        }
    }

    if !args.quiet {
        println!(
            "PC={:04X} SP={:04X} A={:02X} B={:02X} C={:02X} D={:02X} E={:02X} H={:02X} L={:02X} \
             flags[cf={} pf={} acf={} zf={} sf={}] steps={}",
            cpu.pc,
            cpu.sp,
            cpu.a,
            cpu.b,
            cpu.c,
            cpu.d,
            cpu.e,
            cpu.h,
            cpu.l,
            cpu.flags.cf as u8,
            cpu.flags.pf as u8,
            cpu.flags.acf as u8,
            cpu.flags.zf as u8,
            cpu.flags.sf as u8,
            steps,
        );
    }

    if args.dump_state {
        let json = serde_json::to_string_pretty(&cpu).context("serializing final CPU state")?;
        println!("{json}");
    }

    Ok(())
}
