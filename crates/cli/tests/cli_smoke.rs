//! End-to-end smoke tests for the `emu8080` binary: build a tiny ROM on
//! disk, run the binary against it, and check the final register dump.

use pretty_assertions::assert_eq;
use std::io::Write;
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_emu8080"))
}

fn rom_file(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("create temp rom");
    f.write_all(bytes).expect("write rom");
    f
}

#[test]
fn runs_a_program_to_halt_and_prints_final_registers() {
    // MVI A,0x05 ; MVI B,0x03 ; ADD B ; HLT
    let rom = rom_file(&[0x3E, 0x05, 0x06, 0x03, 0x80, 0x76]);

    let output = bin()
        .arg(rom.path())
        .output()
        .expect("run emu8080");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("A=08"), "stdout was: {stdout}");
}

#[test]
fn quiet_suppresses_the_register_dump() {
    let rom = rom_file(&[0x76]); // HLT
    let output = bin()
        .arg(rom.path())
        .arg("--quiet")
        .output()
        .expect("run emu8080");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn offset_accepts_hex_and_loads_at_that_address() {
    let rom = rom_file(&[0x76]); // HLT
    let output = bin()
        .arg(rom.path())
        .args(["--offset", "0x0200"])
        .output()
        .expect("run emu8080");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("PC=0201"), "stdout was: {stdout}");
}

#[test]
fn dump_state_prints_a_json_snapshot_of_registers() {
    // MVI A,0x05 ; MVI B,0x03 ; ADD B ; HLT
    let rom = rom_file(&[0x3E, 0x05, 0x06, 0x03, 0x80, 0x76]);

    let output = bin()
        .arg(rom.path())
        .arg("--quiet")
        .arg("--dump-state")
        .output()
        .expect("run emu8080");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON snapshot");
    assert_eq!(snapshot["a"], 8);
    assert_eq!(snapshot["halted"], true);
    assert!(snapshot.get("memory").is_none(), "memory must not appear in the snapshot");
}

#[test]
fn missing_rom_reports_an_error_and_nonzero_exit() {
    let output = bin()
        .arg("/nonexistent/path/does-not-exist.bin")
        .output()
        .expect("run emu8080");

    assert!(!output.status.success());
}
