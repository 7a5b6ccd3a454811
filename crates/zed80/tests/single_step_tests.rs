//! Data-driven oracle tests in the `SingleStepTests` JSON format.
//!
//! Each file holds generated cases for one opcode: an initial CPU/RAM
//! state, the expected final state, and the cycle trace. The harness
//! applies the initial state through the public accessors, executes one
//! `step()`, and compares.
//!
//! Differences from the raw oracle, by contract of this core:
//! - F bits 3 and 5 are undocumented and not modelled; both sides are
//!   masked before comparing.
//! - WZ/MEMPTR and the Q register are not modelled; those fields are
//!   ignored.
//! - HALT holds PC on the instruction rather than advancing past it, and
//!   the bit-test S flag mirrors Z, so the affected files are skipped.
//! - Block I/O flags follow the documented subset (Z and N from B), so
//!   the INI/OUTI family files are skipped.
//! - Cases hitting deliberate table gaps count as skipped, not failed.
//!
//! Test data lives in `test-data/z80/v1/`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use zed80::{Config, Error, Z80};

/// Undocumented F bits 3 and 5, masked out of every comparison.
const F_MASK: u8 = 0b1101_0111;

/// JSON test case format.
#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<serde_json::Value>,
    #[serde(default)]
    ports: Vec<(u16, u8, String)>,
}

/// JSON CPU state format. `wz`, `ei`, `p`, and `q` describe state this
/// core does not model and are accepted but unused.
#[derive(Deserialize)]
#[allow(dead_code)]
struct CpuState {
    pc: u16,
    sp: u16,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    i: u8,
    r: u8,
    ix: u16,
    iy: u16,
    wz: u16,
    #[serde(rename = "af_")]
    af_alt: u16,
    #[serde(rename = "bc_")]
    bc_alt: u16,
    #[serde(rename = "de_")]
    de_alt: u16,
    #[serde(rename = "hl_")]
    hl_alt: u16,
    iff1: u8,
    iff2: u8,
    im: u8,
    ei: u8,
    p: u8,
    q: u8,
    ram: Vec<(u16, u8)>,
}

/// Files whose expectations depend on behaviour this core deliberately
/// defines differently (see the module docs).
fn skipped(filename: &str) -> bool {
    // HALT: this core holds PC on the instruction.
    if filename == "76.json" {
        return true;
    }
    // BIT rows: S mirrors Z here.
    for prefix in ["cb ", "dd cb __ ", "fd cb __ "] {
        for opcode in 0x40..0x80u16 {
            if filename == format!("{prefix}{opcode:02x}.json") {
                return true;
            }
        }
    }
    // Block I/O flags follow the documented subset.
    matches!(
        filename,
        "ed a2.json"
            | "ed a3.json"
            | "ed aa.json"
            | "ed ab.json"
            | "ed b2.json"
            | "ed b3.json"
            | "ed ba.json"
            | "ed bb.json"
    )
}

/// Apply the initial test state through the public accessors.
fn setup(cpu: &mut Z80, state: &CpuState, ports: &[(u16, u8, String)]) {
    for &(addr, value) in &state.ram {
        cpu.memory_mut().as_mut_slice()[addr as usize] = value;
    }

    let mut port_values: HashMap<u8, u8> = HashMap::new();
    for &(port, value, ref dir) in ports {
        if dir == "r" {
            port_values.insert(port as u8, value);
        }
    }
    cpu.on_device_read(Box::new(move |port| {
        port_values.get(&port).copied().unwrap_or(0xFF)
    }));

    let regs = cpu.registers_mut();
    regs.a = state.a;
    regs.f = state.f;
    regs.b = state.b;
    regs.c = state.c;
    regs.d = state.d;
    regs.e = state.e;
    regs.h = state.h;
    regs.l = state.l;

    regs.a_alt = (state.af_alt >> 8) as u8;
    regs.f_alt = state.af_alt as u8;
    regs.b_alt = (state.bc_alt >> 8) as u8;
    regs.c_alt = state.bc_alt as u8;
    regs.d_alt = (state.de_alt >> 8) as u8;
    regs.e_alt = state.de_alt as u8;
    regs.h_alt = (state.hl_alt >> 8) as u8;
    regs.l_alt = state.hl_alt as u8;

    regs.ix = state.ix;
    regs.iy = state.iy;
    regs.sp = state.sp;
    regs.pc = state.pc;
    regs.i = state.i;
    regs.r = state.r;

    regs.iff1 = state.iff1 != 0;
    regs.iff2 = state.iff2 != 0;
    regs.im = state.im;
}

/// Compare the post-step state, returning a list of mismatches.
fn compare(cpu: &Z80, expected: &CpuState) -> Vec<String> {
    let mut errors = Vec::new();
    let regs = cpu.registers();

    check_u8(&mut errors, "A", regs.a, expected.a);
    check_u8(&mut errors, "F", regs.f & F_MASK, expected.f & F_MASK);
    check_u8(&mut errors, "B", regs.b, expected.b);
    check_u8(&mut errors, "C", regs.c, expected.c);
    check_u8(&mut errors, "D", regs.d, expected.d);
    check_u8(&mut errors, "E", regs.e, expected.e);
    check_u8(&mut errors, "H", regs.h, expected.h);
    check_u8(&mut errors, "L", regs.l, expected.l);

    let af_alt = (u16::from(regs.a_alt) << 8) | u16::from(regs.f_alt);
    check_u16(&mut errors, "AF'", af_alt, expected.af_alt);
    let bc_alt = (u16::from(regs.b_alt) << 8) | u16::from(regs.c_alt);
    check_u16(&mut errors, "BC'", bc_alt, expected.bc_alt);
    let de_alt = (u16::from(regs.d_alt) << 8) | u16::from(regs.e_alt);
    check_u16(&mut errors, "DE'", de_alt, expected.de_alt);
    let hl_alt = (u16::from(regs.h_alt) << 8) | u16::from(regs.l_alt);
    check_u16(&mut errors, "HL'", hl_alt, expected.hl_alt);

    check_u16(&mut errors, "IX", regs.ix, expected.ix);
    check_u16(&mut errors, "IY", regs.iy, expected.iy);
    check_u16(&mut errors, "SP", regs.sp, expected.sp);
    check_u16(&mut errors, "PC", regs.pc, expected.pc);
    check_u8(&mut errors, "I", regs.i, expected.i);
    check_u8(&mut errors, "R", regs.r, expected.r);

    if u8::from(regs.iff1) != expected.iff1 {
        errors.push(format!("IFF1: got {}, want {}", u8::from(regs.iff1), expected.iff1));
    }
    if u8::from(regs.iff2) != expected.iff2 {
        errors.push(format!("IFF2: got {}, want {}", u8::from(regs.iff2), expected.iff2));
    }
    check_u8(&mut errors, "IM", regs.im, expected.im);

    for &(addr, expected_value) in &expected.ram {
        let actual = cpu.memory().as_slice()[addr as usize];
        if actual != expected_value {
            errors.push(format!(
                "RAM[${addr:04X}]: got ${actual:02X}, want ${expected_value:02X}"
            ));
        }
    }

    errors
}

fn check_u8(errors: &mut Vec<String>, name: &str, actual: u8, expected: u8) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:02X}, want ${expected:02X}"));
    }
}

fn check_u16(errors: &mut Vec<String>, name: &str, actual: u16, expected: u16) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:04X}, want ${expected:04X}"));
    }
}

/// Run all SingleStepTests files found on disk.
#[test]
#[ignore = "requires test-data/z80 — run with --ignored"]
fn run_all() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("parent of crate dir")
        .parent()
        .expect("workspace root")
        .join("test-data/z80/v1");

    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests.");
        return;
    }

    let mut filenames: Vec<String> = Vec::new();
    for opcode in 0..=0xFFu8 {
        if !matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD) {
            filenames.push(format!("{opcode:02x}.json"));
        }
    }
    for prefix in ["cb", "dd", "ed", "fd"] {
        for opcode in 0..=0xFFu8 {
            filenames.push(format!("{prefix} {opcode:02x}.json"));
        }
    }
    for prefix in ["dd cb __", "fd cb __"] {
        for opcode in 0..=0xFFu8 {
            filenames.push(format!("{prefix} {opcode:02x}.json"));
        }
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;
    let mut total_skipped = 0u64;

    for filename in &filenames {
        if skipped(filename) {
            total_skipped += 1;
            continue;
        }
        let path = test_dir.join(filename);
        if !path.exists() {
            continue;
        }

        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
        let tests: Vec<TestCase> = serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()));

        let mut file_pass = 0u32;
        let mut file_fail = 0u32;
        let mut first_failures: Vec<String> = Vec::new();

        for test in &tests {
            let config = Config::builder().memory_size(0x1_0000).build();
            let mut cpu = Z80::new(config);
            setup(&mut cpu, &test.initial, &test.ports);

            match cpu.step() {
                Ok(cycles) => {
                    let mut errors = compare(&cpu, &test.final_state);
                    let expected_cycles = test.cycles.len() as u64;
                    if cycles.get() != expected_cycles {
                        errors.push(format!(
                            "cycles: got {}, want {expected_cycles}",
                            cycles.get()
                        ));
                    }
                    if errors.is_empty() {
                        file_pass += 1;
                    } else {
                        file_fail += 1;
                        if first_failures.len() < 5 {
                            first_failures
                                .push(format!("  FAIL [{}]: {}", test.name, errors.join(", ")));
                        }
                    }
                }
                // Deliberate table gaps are skips, not failures.
                Err(Error::UnimplementedOpcode { .. }) => {
                    total_skipped += 1;
                }
                Err(other) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!("  ERROR [{}]: {other}", test.name));
                    }
                }
            }
        }

        let status = if file_fail == 0 { "PASS" } else { "FAIL" };
        println!("{filename}: {status} — {file_pass}/{} passed", file_pass + file_fail);
        for message in &first_failures {
            println!("{message}");
        }

        total_pass += u64::from(file_pass);
        total_fail += u64::from(file_fail);
    }

    println!();
    println!("=== SingleStepTests summary ===");
    println!("pass: {total_pass}, fail: {total_fail}, skipped: {total_skipped}");
    assert_eq!(total_fail, 0, "{total_fail} oracle cases failed");
}
