//! A minimal CP/M BDOS shim: just enough of functions 2 and 9 to run
//! classic 8080 instruction-exerciser ROMs (`TST8080.COM`, `CPUTEST.COM`,
//! `8080PRE.COM`, `8080EXM.COM`), which `CALL 0x0005` to print their
//! results instead of using any documented I/O port.
//!
//! None of those ROMs ship in this repository — they're third-party test
//! images, not something to embed here. Point the CLI at a copy on disk to
//! use this.

use emu_core::{Cpu8080, Memory8080};
use std::io::Write;

/// Address CP/M programs `CALL` into for all BDOS services.
const BDOS_ENTRY: u16 = 0x0005;

/// Patch a `RET` at the BDOS entry point so that a CALL to it returns
/// immediately once [`intercept`] has handled (or ignored) the request.
pub fn install<M: Memory8080>(cpu: &mut Cpu8080<M>) {
    cpu.write(BDOS_ENTRY, 0xC9); // RET
}

/// Check whether the CPU is sitting at the BDOS entry point and, if so,
/// service function 2 (print character in E) or function 9 (print
/// `$`-terminated string at DE). Call this immediately before each
/// [`Cpu8080::step`].
///
/// Any other function number is silently ignored, matching the original
/// test harness this is modeled on.
pub fn intercept<M: Memory8080>(cpu: &Cpu8080<M>, out: &mut impl Write) {
    if cpu.pc != BDOS_ENTRY {
        return;
    }

    match cpu.c {
        0x09 => {
            let mut addr = cpu.de();
            loop {
                let byte = cpu.read(addr);
                if byte == b'$' {
                    break;
                }
                let _ = out.write_all(&[byte]);
                addr = addr.wrapping_add(1);
            }
        }
        0x02 => {
            let _ = out.write_all(&[cpu.e]);
        }
        _ => {}
    }
}
