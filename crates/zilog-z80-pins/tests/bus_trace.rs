//! Cycle-by-cycle golden bus traces, table-driven from JSON.
//!
//! Each trace lists, for every T-state, the signal word, address bus and
//! data bus a probe on the socket would see after the host has serviced
//! that cycle.

use emu_core::SimpleBus;
use serde::Deserialize;
use zilog_z80_pins::{Machine, Signal};

#[derive(Deserialize)]
struct Trace {
    name: String,
    program: Vec<u8>,
    steps: Vec<Step>,
}

#[derive(Deserialize)]
struct Step {
    signals: Vec<String>,
    addr: u16,
    data: u8,
}

fn mask(name: &str) -> u16 {
    match name {
        "M1" => Signal::M1.mask(),
        "MREQ" => Signal::MREQ.mask(),
        "IORQ" => Signal::IORQ.mask(),
        "RD" => Signal::RD.mask(),
        "WR" => Signal::WR.mask(),
        "RFSH" => Signal::RFSH.mask(),
        "HALT" => Signal::HALT.mask(),
        "WAIT" => Signal::WAIT.mask(),
        "WSAMP" => Signal::WSAMP.mask(),
        other => panic!("unknown signal name: {other}"),
    }
}

fn run_trace(json: &str, setup: impl FnOnce(&mut Machine<SimpleBus>)) -> Machine<SimpleBus> {
    let trace: Trace = serde_json::from_str(json).expect("trace JSON parses");
    let mut bus = SimpleBus::new();
    bus.load(0, &trace.program);
    let mut m = Machine::new(bus);
    setup(&mut m);

    for (index, step) in trace.steps.iter().enumerate() {
        m.step();
        let want = step
            .signals
            .iter()
            .fold(0u16, |word, name| word | mask(name));
        let t = index + 1;
        assert_eq!(
            m.cpu().signals(),
            want,
            "{}: signal word at T{t}",
            trace.name
        );
        assert_eq!(m.cpu().address(), step.addr, "{}: address at T{t}", trace.name);
        assert_eq!(m.cpu().data(), step.data, "{}: data at T{t}", trace.name);
    }
    m
}

#[test]
fn immediate_load_waveform() {
    let m = run_trace(
        r#"{
            "name": "LD A,n",
            "program": [62, 17],
            "steps": [
                { "signals": ["M1"], "addr": 0, "data": 0 },
                { "signals": ["M1", "MREQ", "RD", "WSAMP"], "addr": 0, "data": 62 },
                { "signals": ["RFSH"], "addr": 0, "data": 62 },
                { "signals": ["MREQ", "RFSH"], "addr": 0, "data": 62 },
                { "signals": [], "addr": 1, "data": 62 },
                { "signals": ["MREQ", "RD", "WSAMP"], "addr": 1, "data": 17 },
                { "signals": [], "addr": 1, "data": 17 }
            ]
        }"#,
        |_| {},
    );
    assert_eq!(m.cpu().regs.a(), 17);
}

#[test]
fn sixteen_bit_inc_waveform() {
    // INC BC stretches the fetch to six T-states; the two extensions are
    // bus-idle.
    let m = run_trace(
        r#"{
            "name": "INC BC",
            "program": [3],
            "steps": [
                { "signals": ["M1"], "addr": 0, "data": 0 },
                { "signals": ["M1", "MREQ", "RD", "WSAMP"], "addr": 0, "data": 3 },
                { "signals": ["RFSH"], "addr": 0, "data": 3 },
                { "signals": ["MREQ", "RFSH"], "addr": 0, "data": 3 },
                { "signals": [], "addr": 0, "data": 3 },
                { "signals": [], "addr": 0, "data": 3 }
            ]
        }"#,
        |_| {},
    );
    assert_eq!(m.cpu().regs.bc(), 1);
}

#[test]
fn indirect_store_waveform() {
    // LD (BC),A: the data bus carries the accumulator from the drive
    // T-state through the write strobe.
    let m = run_trace(
        r#"{
            "name": "LD (BC),A",
            "program": [2],
            "steps": [
                { "signals": ["M1"], "addr": 0, "data": 0 },
                { "signals": ["M1", "MREQ", "RD", "WSAMP"], "addr": 0, "data": 2 },
                { "signals": ["RFSH"], "addr": 0, "data": 2 },
                { "signals": ["MREQ", "RFSH"], "addr": 0, "data": 2 },
                { "signals": [], "addr": 64, "data": 2 },
                { "signals": ["MREQ", "WSAMP"], "addr": 64, "data": 119 },
                { "signals": ["MREQ", "WR"], "addr": 64, "data": 119 }
            ]
        }"#,
        |m| {
            m.cpu_mut().regs.set_bc(0x0040);
            m.cpu_mut().regs.set_a(0x77);
        },
    );
    assert_eq!(m.bus().peek(0x0040), 0x77);
}
