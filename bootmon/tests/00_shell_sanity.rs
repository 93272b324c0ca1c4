// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted end-to-end shell sessions against fake collaborators.
//!
//! Bytes go into the receive queue exactly as the UART interrupt would enqueue them; the shell
//! is polled as the monitor's main loop would poll it; everything it prints is captured.

use core::fmt;
use core::time::Duration;
use std::sync::Mutex;

use libbootmon::console::interface;
use libbootmon::loader;
use libbootmon::memory::Region;
use libbootmon::shell::command::{interface as cmd_interface, Args, CommandSpec, Context, ParamSet};
use libbootmon::shell::commands::Load;
use libbootmon::shell::queue::ByteQueue;
use libbootmon::shell::Shell;

//--------------------------------------------------------------------------------------------------
// Test doubles
//--------------------------------------------------------------------------------------------------

struct RecordingConsole {
    out: Mutex<String>,
}

impl RecordingConsole {
    fn new() -> Self {
        Self {
            out: Mutex::new(String::new()),
        }
    }

    fn output(&self) -> String {
        self.out.lock().unwrap().clone()
    }
}

impl interface::Write for RecordingConsole {
    fn write_char(&self, c: char) {
        self.out.lock().unwrap().push(c);
    }

    fn write_fmt(&self, args: fmt::Arguments) -> fmt::Result {
        use fmt::Write;
        self.out.lock().unwrap().write_fmt(args)
    }

    fn flush(&self) {}
}

impl interface::Read for RecordingConsole {
    fn clear_rx(&self) {}
}

impl interface::Statistics for RecordingConsole {}
impl interface::All for RecordingConsole {}

/// A command handler that records its invocations.
struct Probe {
    calls: Mutex<Vec<Args>>,
}

impl Probe {
    const fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Args> {
        self.calls.lock().unwrap().clone()
    }
}

impl cmd_interface::Command for Probe {
    fn execute(&self, args: &Args, _ctx: &Context) {
        self.calls.lock().unwrap().push(*args);
    }
}

/// A storage device that records the requests it receives.
struct RecordingDevice {
    requests: Mutex<Vec<(u64, u32, usize)>>,
}

impl RecordingDevice {
    const fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<(u64, u32, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

impl loader::interface::BlockDevice for RecordingDevice {
    unsafe fn read_blocks(
        &self,
        lba: u64,
        blocks: u32,
        dest: usize,
        _timeout: Duration,
    ) -> Result<(), &'static str> {
        self.requests.lock().unwrap().push((lba, blocks, dest));
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }
}

fn feed(shell: &mut Shell, queue: &ByteQueue, bytes: &[u8]) {
    // Small chunks, so bursts never exceed the queue's usable capacity.
    for chunk in bytes.chunks(16) {
        for byte in chunk {
            queue.enqueue(*byte);
        }
        shell.poll();
    }
}

fn probe_spec<'a>(name: &'a str, probe: &'a Probe) -> CommandSpec<'a> {
    CommandSpec {
        name,
        usage: "",
        summary: "probe",
        defaults: &[],
        handler: probe,
    }
}

//--------------------------------------------------------------------------------------------------
// Sessions
//--------------------------------------------------------------------------------------------------

#[test]
fn help_session_lists_commands_and_defaults() {
    struct HelpCmd;
    impl cmd_interface::Command for HelpCmd {
        fn execute(&self, _args: &Args, ctx: &Context) {
            libbootmon::shell::command::print_help(ctx.commands, ctx.console);
        }
    }
    static HELP: HelpCmd = HelpCmd;
    static DEFAULTS: [ParamSet; 1] = [ParamSet {
        label: "kernel",
        len: 16384,
        lba: 2048,
        addr: 0x20_0000,
    }];

    let probe = Probe::new();
    let set = [
        CommandSpec {
            name: "help",
            usage: "",
            summary: "Display this help message",
            defaults: &[],
            handler: &HELP,
        },
        CommandSpec {
            name: "load_sd",
            usage: "[N [L [M]]]",
            summary: "Load N blocks from SD LBA L to address M",
            defaults: &DEFAULTS,
            handler: &probe,
        },
    ];

    let queue = ByteQueue::new();
    let con = RecordingConsole::new();
    let mut shell = Shell::new(&queue, &set, &con);
    shell.greet();

    feed(&mut shell, &queue, b"help\r");

    let out = con.output();
    assert!(out.contains("Available commands:"));
    assert!(out.contains("load_sd"));
    assert!(out.contains("Defaults:"));
    assert!(out.contains("kernel: len=16384 lba=2048 addr=0x00200000"));
}

#[test]
fn spec_example_load_session_reaches_the_device() {
    static DEFAULTS: [ParamSet; 1] = [ParamSet {
        label: "kernel",
        len: 100,
        lba: 316,
        addr: 0x20_0000,
    }];

    let device = RecordingDevice::new();
    // A permissive window, so the example's high destination passes through unclamped.
    let load = Load::new(&device, Region::new(0, usize::MAX), &DEFAULTS);
    let set = [CommandSpec {
        name: "load_sd",
        usage: "[N [L [M]]]",
        summary: "",
        defaults: &DEFAULTS,
        handler: &load,
    }];

    let queue = ByteQueue::new();
    let con = RecordingConsole::new();
    let mut shell = Shell::new(&queue, &set, &con);
    shell.greet();

    feed(&mut shell, &queue, b"load_sd 10 896 3221225472\r");

    assert_eq!(device.requests(), [(896, 10, 3_221_225_472)]);
    assert!(con.output().contains("Copying 10 blocks from LBA 896"));
}

#[test]
fn lone_carriage_return_is_ignored() {
    let probe = Probe::new();
    let set = [probe_spec("jump", &probe)];

    let queue = ByteQueue::new();
    let con = RecordingConsole::new();
    let mut shell = Shell::new(&queue, &set, &con);
    shell.greet();

    feed(&mut shell, &queue, b"\r");

    // No dispatch, no history entry: an up-arrow afterwards finds nothing to recall.
    feed(&mut shell, &queue, b"\x1b[A");
    assert!(probe.calls().is_empty());
    assert!(!con.output().contains("\x1b[2K"));
    assert_eq!(con.output().matches("> ").count(), 2);
}

#[test]
fn spec_example_abbreviated_jump() {
    let probe = Probe::new();
    let set = [probe_spec("jump", &probe)];

    let queue = ByteQueue::new();
    let con = RecordingConsole::new();
    let mut shell = Shell::new(&queue, &set, &con);
    shell.greet();

    feed(&mut shell, &queue, b"j 100\r");

    assert_eq!(
        probe.calls(),
        [Args {
            count: 1,
            arg1: 100,
            arg2: 0,
            arg3: 0,
        }]
    );
}

#[test]
fn tab_completion_session() {
    let print_probe = Probe::new();
    let help_probe = Probe::new();
    let set = [
        probe_spec("print_ddr", &print_probe),
        probe_spec("help", &help_probe),
    ];

    let queue = ByteQueue::new();
    let con = RecordingConsole::new();
    let mut shell = Shell::new(&queue, &set, &con);
    shell.greet();

    feed(&mut shell, &queue, b"pr\t\r");

    // "pr" completed to "print_ddr" and dispatched to the right handler.
    assert_eq!(print_probe.calls().len(), 1);
    assert!(help_probe.calls().is_empty());
    assert!(con.output().contains("print_ddr"));
}

#[test]
fn history_recall_session() {
    let probe = Probe::new();
    let set = [probe_spec("jump", &probe)];

    let queue = ByteQueue::new();
    let con = RecordingConsole::new();
    let mut shell = Shell::new(&queue, &set, &con);
    shell.greet();

    feed(&mut shell, &queue, b"jump 0x100\r");
    feed(&mut shell, &queue, b"jump 0x200\r");

    // Two steps back recalls the first command; CR re-runs it.
    feed(&mut shell, &queue, b"\x1b[A\x1b[A\r");

    let calls = probe.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2].arg1, 0x100);
}

#[test]
fn ambiguous_and_unknown_sessions_execute_nothing() {
    let load = Probe::new();
    let load_sd = Probe::new();
    let set = [probe_spec("load", &load), probe_spec("load_sd", &load_sd)];

    let queue = ByteQueue::new();
    let con = RecordingConsole::new();
    let mut shell = Shell::new(&queue, &set, &con);
    shell.greet();

    feed(&mut shell, &queue, b"load 1 2 3\r");
    feed(&mut shell, &queue, b"nope\r");

    assert!(load.calls().is_empty());
    assert!(load_sd.calls().is_empty());

    let out = con.output();
    assert!(out.contains("Ambiguous command 'load'."));
    assert!(out.contains("Unknown command 'nope'."));
    assert!(out.contains("Available commands:"));
}
