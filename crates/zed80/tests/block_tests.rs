//! Block transfer, block compare, and block I/O behaviour.

use std::cell::RefCell;
use std::rc::Rc;

use zed80::{Config, Z80, CF, NF, PF, SF, ZF};

fn cpu_with_program(program: &[u8]) -> Z80 {
    let config = Config::builder().memory_size(0x1_0000).build();
    let mut cpu = Z80::new(config);
    cpu.load_memory(program).expect("program fits");
    cpu
}

#[test]
fn ldir_copies_and_reports_repeat_cycles() {
    let mut cpu = cpu_with_program(&[0xED, 0xB0, 0x76]); // LDIR; HALT
    {
        let regs = cpu.registers_mut();
        regs.set_hl(0x4000);
        regs.set_de(0x5000);
        regs.set_bc(3);
    }
    cpu.memory_mut().as_mut_slice()[0x4000..0x4003].copy_from_slice(&[1, 2, 3]);

    assert_eq!(cpu.step().unwrap().get(), 21);
    assert_eq!(cpu.pc(), 0x0000, "repeating step holds PC");
    assert_eq!(cpu.step().unwrap().get(), 21);
    assert_eq!(cpu.step().unwrap().get(), 16, "terminating step");
    assert_eq!(cpu.pc(), 0x0002);

    let memory = cpu.memory().as_slice();
    assert_eq!(&memory[0x5000..0x5003], &[1, 2, 3]);

    let regs = cpu.registers();
    assert_eq!(regs.bc(), 0);
    assert_eq!(regs.hl(), 0x4003);
    assert_eq!(regs.de(), 0x5003);
    assert_eq!(regs.f & PF, 0, "P/V clear once BC is exhausted");
    assert_eq!(regs.f & NF, 0);
}

#[test]
fn ldir_moves_both_pointers_by_the_original_count() {
    let mut cpu = cpu_with_program(&[0xED, 0xB0, 0x76]);
    let original_bc = 0x0020;
    {
        let regs = cpu.registers_mut();
        regs.set_hl(0x4000);
        regs.set_de(0x6000);
        regs.set_bc(original_bc);
    }

    while !cpu.is_finished() {
        cpu.step().unwrap();
    }

    let regs = cpu.registers();
    assert_eq!(regs.hl(), 0x4000 + original_bc);
    assert_eq!(regs.de(), 0x6000 + original_bc);
    assert_eq!(regs.de() - regs.hl(), 0x2000);
}

#[test]
fn lddr_walks_downward() {
    let mut cpu = cpu_with_program(&[0xED, 0xB8, 0x76]); // LDDR; HALT
    {
        let regs = cpu.registers_mut();
        regs.set_hl(0x4002);
        regs.set_de(0x5002);
        regs.set_bc(3);
    }
    cpu.memory_mut().as_mut_slice()[0x4000..0x4003].copy_from_slice(&[1, 2, 3]);

    while !cpu.is_finished() {
        cpu.step().unwrap();
    }

    assert_eq!(&cpu.memory().as_slice()[0x5000..0x5003], &[1, 2, 3]);
    let regs = cpu.registers();
    assert_eq!(regs.hl(), 0x3FFF);
    assert_eq!(regs.de(), 0x4FFF);
}

#[test]
fn ldi_single_step_flags() {
    let mut cpu = cpu_with_program(&[0xED, 0xA0, 0x76]); // LDI; HALT
    {
        let regs = cpu.registers_mut();
        regs.set_hl(0x4000);
        regs.set_de(0x5000);
        regs.set_bc(2);
        regs.f = SF | ZF | CF; // preserved bits
    }

    assert_eq!(cpu.step().unwrap().get(), 16);
    assert_eq!(cpu.pc(), 0x0002, "single-shot form advances");

    let regs = cpu.registers();
    assert_eq!(regs.bc(), 1);
    assert_eq!(regs.f & (SF | ZF | CF), SF | ZF | CF);
    assert_eq!(regs.f & PF, PF, "BC still nonzero");
}

/// Scenario: CPDR scanning down memory for the accumulator value.
#[test]
fn cpdr_scans_down_until_match() {
    let mut cpu = cpu_with_program(&[0xED, 0xB9, 0x76]); // CPDR; HALT
    {
        let memory = cpu.memory_mut().as_mut_slice();
        memory[0x1116] = 0xF3;
        memory[0x1117] = 0x00;
        memory[0x1118] = 0x52;
    }
    {
        let regs = cpu.registers_mut();
        regs.a = 0xF3;
        regs.set_bc(0x0007);
        regs.set_hl(0x1118);
        regs.f = CF | SF | PF; // carry/sign/parity set, zero/subtract clear
    }

    let mut cycles = 0;
    let mut steps = 0;
    while !cpu.is_finished() {
        cycles += cpu.step().unwrap().get();
        steps += 1;
    }

    assert_eq!(steps, 4, "two continuing steps, the match, and HALT");
    assert_eq!(cycles, 21 * 2 + 16 + 4);
    assert_eq!(cpu.pc(), 0x0002);

    let regs = cpu.registers();
    assert_eq!(regs.bc(), 0x0004);
    assert_eq!(regs.hl(), 0x1115);
    assert!(regs.flag(CF), "compare preserves carry");
    assert!(regs.flag(ZF), "match found");
    assert!(regs.flag(NF));
    assert!(!regs.flag(SF));
    assert!(regs.flag(PF), "BC still nonzero");

    let memory = cpu.memory().as_slice();
    assert_eq!(memory[0x1116], 0xF3, "memory untouched");
    assert_eq!(memory[0x1117], 0x00);
    assert_eq!(memory[0x1118], 0x52);
}

#[test]
fn cpir_stops_when_bc_runs_out() {
    let mut cpu = cpu_with_program(&[0xED, 0xB1, 0x76]); // CPIR; HALT
    {
        let regs = cpu.registers_mut();
        regs.a = 0xAA; // never present
        regs.set_hl(0x4000);
        regs.set_bc(3);
    }

    assert_eq!(cpu.step().unwrap().get(), 21);
    assert_eq!(cpu.step().unwrap().get(), 21);
    assert_eq!(cpu.step().unwrap().get(), 16);

    let regs = cpu.registers();
    assert_eq!(regs.bc(), 0);
    assert!(!regs.flag(ZF));
    assert!(!regs.flag(PF), "BC exhausted");
}

#[test]
fn cpi_preserves_carry_and_sets_subtract() {
    let mut cpu = cpu_with_program(&[0xED, 0xA1, 0x76]); // CPI; HALT
    {
        let regs = cpu.registers_mut();
        regs.a = 0x10;
        regs.set_hl(0x4000);
        regs.set_bc(1);
        regs.f = CF;
    }
    cpu.memory_mut().as_mut_slice()[0x4000] = 0x10;

    cpu.step().unwrap();

    let regs = cpu.registers();
    assert!(regs.flag(ZF), "bytes matched");
    assert!(regs.flag(NF));
    assert!(regs.flag(CF), "carry preserved");
    assert!(!regs.flag(PF), "BC reached zero");
    assert_eq!(regs.hl(), 0x4001);
}

#[test]
fn inir_reads_ports_into_memory() {
    let reads: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&reads);

    let mut cpu = cpu_with_program(&[0xED, 0xB2, 0x76]); // INIR; HALT
    cpu.on_device_read(Box::new(move |port| {
        log.borrow_mut().push(port);
        0x5A
    }));
    {
        let regs = cpu.registers_mut();
        regs.set_hl(0x4000);
        regs.b = 3;
        regs.c = 0x10;
    }

    assert_eq!(cpu.step().unwrap().get(), 21);
    assert_eq!(cpu.step().unwrap().get(), 21);
    assert_eq!(cpu.step().unwrap().get(), 16);

    assert_eq!(*reads.borrow(), vec![0x10, 0x10, 0x10]);
    assert_eq!(&cpu.memory().as_slice()[0x4000..0x4003], &[0x5A; 3]);
    let regs = cpu.registers();
    assert_eq!(regs.b, 0);
    assert_eq!(regs.hl(), 0x4003);
    assert!(regs.flag(ZF), "B exhausted");
    assert!(regs.flag(NF));
}

#[test]
fn otir_writes_memory_to_the_port_in_order() {
    let writes: Rc<RefCell<Vec<(u8, u8)>>> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&writes);

    let mut cpu = cpu_with_program(&[0xED, 0xB3, 0x76]); // OTIR; HALT
    cpu.on_device_write(Box::new(move |port, value| {
        log.borrow_mut().push((port, value));
    }));
    cpu.memory_mut().as_mut_slice()[0x4000..0x4003].copy_from_slice(&[7, 8, 9]);
    {
        let regs = cpu.registers_mut();
        regs.set_hl(0x4000);
        regs.b = 3;
        regs.c = 0x20;
    }

    while !cpu.is_finished() {
        cpu.step().unwrap();
    }

    assert_eq!(
        *writes.borrow(),
        vec![(0x20, 7), (0x20, 8), (0x20, 9)]
    );
    assert_eq!(cpu.registers().b, 0);
}

#[test]
fn outd_moves_hl_downward() {
    let writes: Rc<RefCell<Vec<(u8, u8)>>> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&writes);

    let mut cpu = cpu_with_program(&[0xED, 0xAB, 0x76]); // OUTD; HALT
    cpu.on_device_write(Box::new(move |port, value| {
        log.borrow_mut().push((port, value));
    }));
    cpu.memory_mut().as_mut_slice()[0x4000] = 0x33;
    {
        let regs = cpu.registers_mut();
        regs.set_hl(0x4000);
        regs.b = 1;
        regs.c = 0x30;
    }

    assert_eq!(cpu.step().unwrap().get(), 16);

    assert_eq!(*writes.borrow(), vec![(0x30, 0x33)]);
    let regs = cpu.registers();
    assert_eq!(regs.hl(), 0x3FFF);
    assert!(regs.flag(ZF));
}
