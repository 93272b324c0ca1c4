// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive command shell.
//!
//! Consumes raw bytes from the receive queue, maintains the visible command line, and hands
//! finished lines to the command dispatcher. All terminal I/O goes through the injected console,
//! so complete shell sessions are scriptable in tests.

pub mod command;
pub mod commands;
pub mod history;
pub mod queue;

use crate::console;
use command::{CommandSpec, Context, Resolution};
use history::{HistoryRing, Recalled};
use queue::ByteQueue;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Maximum length of one command line.
pub const LINE_CAPACITY: usize = 32;

/// One line of operator input.
pub type Line = heapless::String<LINE_CAPACITY>;

/// Tracks a partially received ANSI escape sequence.
#[derive(Copy, Clone, PartialEq, Eq)]
enum EscapeState {
    Idle,
    SawEscape,
    SawBracket,
}

/// The shell. Owns the line buffer, the history and the escape-sequence parser; borrows the
/// receive queue, the command table and the console.
pub struct Shell<'a> {
    rx: &'a ByteQueue,
    commands: &'a [CommandSpec<'a>],
    con: &'a (dyn console::interface::All + 'a),
    line: Line,
    history: HistoryRing,
    escape: EscapeState,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<'a> Shell<'a> {
    /// Create an instance.
    pub fn new(
        rx: &'a ByteQueue,
        commands: &'a [CommandSpec<'a>],
        con: &'a (dyn console::interface::All + 'a),
    ) -> Self {
        Self {
            rx,
            commands,
            con,
            line: Line::new(),
            history: HistoryRing::new(),
            escape: EscapeState::Idle,
        }
    }

    /// Emit an initial newline and a fresh prompt. Call once before the first `poll()`.
    pub fn greet(&mut self) {
        self.put("\r\n");
        self.prompt();
    }

    /// Drain all pending receive bytes. Main-loop entry point.
    pub fn poll(&mut self) {
        while let Some(byte) = self.rx.dequeue() {
            self.handle_byte(byte);
        }
    }

    //------------------------------------------------------------------------------
    // Terminal output helpers
    //------------------------------------------------------------------------------

    fn put(&self, s: &str) {
        self.con.write_fmt(format_args!("{}", s)).unwrap();
    }

    fn echo(&self, c: char) {
        self.con.write_char(c);
    }

    /// Reset the line buffer and print a fresh prompt.
    fn prompt(&mut self) {
        self.line.clear();
        self.put("> ");
    }

    /// Erase the visible line, redraw the prompt and load `contents` as the new line.
    fn redraw(&mut self, contents: &str) {
        self.put("\x1b[2K\x1b[0G");
        self.prompt();

        for c in contents.chars() {
            if self.line.push(c).is_err() {
                break;
            }
        }
        self.put(self.line.as_str());
    }

    //------------------------------------------------------------------------------
    // Byte classification
    //------------------------------------------------------------------------------

    /// Process one input byte. The escape sub-parser runs first; escape bytes are in the control
    /// range and must not reach the classification below.
    fn handle_byte(&mut self, byte: u8) {
        if self.try_handle_escape(byte) {
            return;
        }

        match byte {
            // Line terminator: record, dispatch, fresh prompt.
            b'\r' | b'\n' => {
                self.put("\r\n");
                self.history.record(self.line.as_str());
                self.dispatch();
            }

            // Destructive backspace.
            0x08 | 0x7f => {
                if self.line.pop().is_some() {
                    self.put("\x08 \x08");
                }
            }

            // Horizontal tab: complete against the registry.
            b'\t' => self.complete(),

            // Ctrl-L: fresh line, no caret echo.
            0x0c => {
                self.echo(0x0c as char);
                self.prompt();
            }

            // Printable: append if capacity remains, echo only what was appended.
            0x20..=0x7e => {
                let c = byte as char;
                if self.line.push(c).is_ok() {
                    self.echo(c);
                }
            }

            // Remaining control and high bytes echo in caret notation.
            _ => {
                self.echo('^');
                self.echo((byte ^ 0x40) as char);
            }
        }
    }

    /// Advance the escape-sequence parser. Returns whether the byte was consumed.
    fn try_handle_escape(&mut self, byte: u8) -> bool {
        match self.escape {
            EscapeState::SawEscape => {
                // Only CSI continues the sequence; anything else aborts without side effects.
                self.escape = if byte == b'[' {
                    EscapeState::SawBracket
                } else {
                    EscapeState::Idle
                };
                true
            }
            EscapeState::SawBracket => {
                match byte {
                    b'A' => self.history_previous(),
                    b'B' => self.history_next(),
                    _ => {}
                }
                self.escape = EscapeState::Idle;
                true
            }
            EscapeState::Idle => {
                if byte == 0x1b {
                    self.escape = EscapeState::SawEscape;
                    return true;
                }
                false
            }
        }
    }

    //------------------------------------------------------------------------------
    // History browsing
    //------------------------------------------------------------------------------

    fn history_previous(&mut self) {
        if let Some(entry) = self.history.recall_previous() {
            self.redraw(entry.as_str());
        }
    }

    fn history_next(&mut self) {
        match self.history.recall_next() {
            Recalled::Inactive => {}
            Recalled::Cleared => self.redraw(""),
            Recalled::Entry(entry) => self.redraw(entry.as_str()),
        }
    }

    //------------------------------------------------------------------------------
    // Tab completion
    //------------------------------------------------------------------------------

    fn complete(&mut self) {
        let (count, candidate) = command::match_count(self.commands, self.line.as_str());

        match count {
            0 => {}

            // Unique match: append and echo the missing suffix.
            1 => {
                let name = candidate.unwrap_or("");
                for c in name[self.line.len()..].chars() {
                    if self.line.push(c).is_err() {
                        break;
                    }
                    self.echo(c);
                }
            }

            // Multiple matches: list them, then reprint prompt and unmodified partial input.
            _ => {
                self.put("\r\n");
                for spec in self.commands {
                    if spec.name.starts_with(self.line.as_str()) {
                        self.put(spec.name);
                        self.put("  ");
                    }
                }
                self.put("\r\n> ");
                self.put(self.line.as_str());
            }
        }
    }

    //------------------------------------------------------------------------------
    // Dispatch
    //------------------------------------------------------------------------------

    fn dispatch(&mut self) {
        if self.line.is_empty() {
            self.prompt();
            return;
        }

        match command::resolve(self.commands, self.line.as_str()) {
            Resolution::Unknown => {
                self.con
                    .write_fmt(format_args!("Unknown command '{}'.\r\n", self.line))
                    .unwrap();
                command::print_help(self.commands, self.con);
            }

            Resolution::Ambiguous(name_len) => {
                self.con
                    .write_fmt(format_args!(
                        "Ambiguous command '{}'.\r\n",
                        &self.line.as_str()[..name_len]
                    ))
                    .unwrap();
            }

            Resolution::Found(spec) => {
                let args = command::parse_args(self.line.as_str());
                let ctx = Context {
                    commands: self.commands,
                    console: self.con,
                };
                spec.handler.execute(&args, &ctx);
            }
        }

        self.prompt();
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::command::{interface, Args, CommandSpec, Context};
    use super::*;
    use crate::console::interface as con_interface;
    use core::fmt;
    use std::{string::String, sync::Mutex, vec::Vec};

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

    impl con_interface::Write for RecordingConsole {
        fn write_char(&self, c: char) {
            self.out.lock().unwrap().push(c);
        }

        fn write_fmt(&self, args: fmt::Arguments) -> fmt::Result {
            use fmt::Write;
            self.out.lock().unwrap().write_fmt(args)
        }

        fn flush(&self) {}
    }

    impl con_interface::Read for RecordingConsole {
        fn clear_rx(&self) {}
    }

    impl con_interface::Statistics for RecordingConsole {}
    impl con_interface::All for RecordingConsole {}

    /// Records every invocation.
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

    impl interface::Command for Probe {
        fn execute(&self, args: &Args, _ctx: &Context) {
            self.calls.lock().unwrap().push(*args);
        }
    }

    fn feed(shell: &mut Shell, queue: &ByteQueue, bytes: &[u8]) {
        for chunk in bytes.chunks(16) {
            for byte in chunk {
                queue.enqueue(*byte);
            }
            shell.poll();
        }
    }

    #[test]
    fn printable_bytes_echo_and_accumulate() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "hep",
            usage: "",
            summary: "",
            defaults: &[],
            handler: &probe,
        }];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        // 'l' is erased by the backspace before the terminator arrives.
        feed(&mut shell, &queue, b"hel\x08p\r");

        assert_eq!(probe.calls().len(), 1);
        assert!(con.output().contains("hel\x08 \x08p"));
    }

    #[test]
    fn empty_line_redraws_the_prompt_only() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "jump",
            usage: "",
            summary: "",
            defaults: &[],
            handler: &probe,
        }];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        feed(&mut shell, &queue, b"\r");

        assert!(probe.calls().is_empty());
        // Greeting prompt plus the redrawn one.
        assert_eq!(con.output().matches("> ").count(), 2);
    }

    #[test]
    fn abbreviated_dispatch_with_argument() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "jump",
            usage: "",
            summary: "",
            defaults: &[],
            handler: &probe,
        }];
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
    fn ambiguous_input_invokes_no_handler() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let load = Probe::new();
        let load_sd = Probe::new();
        let set = [
            CommandSpec {
                name: "load",
                usage: "",
                summary: "",
                defaults: &[],
                handler: &load,
            },
            CommandSpec {
                name: "load_sd",
                usage: "",
                summary: "",
                defaults: &[],
                handler: &load_sd,
            },
        ];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        feed(&mut shell, &queue, b"load 1\r");

        assert!(load.calls().is_empty());
        assert!(load_sd.calls().is_empty());
        assert!(con.output().contains("Ambiguous command 'load'."));
    }

    #[test]
    fn unknown_input_prints_help() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "help",
            usage: "",
            summary: "Display this help message",
            defaults: &[],
            handler: &probe,
        }];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        feed(&mut shell, &queue, b"wat 1 2\r");

        assert!(probe.calls().is_empty());
        assert!(con.output().contains("Unknown command 'wat 1 2'."));
        assert!(con.output().contains("Available commands:"));
    }

    #[test]
    fn unique_tab_completion_extends_the_line() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [
            CommandSpec {
                name: "print_ddr",
                usage: "",
                summary: "",
                defaults: &[],
                handler: &probe,
            },
            CommandSpec {
                name: "help",
                usage: "",
                summary: "",
                defaults: &[],
                handler: &probe,
            },
        ];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        feed(&mut shell, &queue, b"pr\t\r");

        // The completed line dispatches as print_ddr.
        assert_eq!(probe.calls().len(), 1);
        assert!(con.output().contains("print_ddr"));
    }

    #[test]
    fn multi_match_tab_lists_candidates_and_keeps_the_partial() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [
            CommandSpec {
                name: "load",
                usage: "",
                summary: "",
                defaults: &[],
                handler: &probe,
            },
            CommandSpec {
                name: "load_sd",
                usage: "",
                summary: "",
                defaults: &[],
                handler: &probe,
            },
        ];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        feed(&mut shell, &queue, b"lo\t");

        let out = con.output();
        assert!(out.contains("load  load_sd"));
        // Prompt redrawn with the unmodified partial.
        assert!(out.ends_with("> lo"));
    }

    #[test]
    fn escape_sequences_drive_history_recall() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "jump",
            usage: "",
            summary: "",
            defaults: &[],
            handler: &probe,
        }];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        feed(&mut shell, &queue, b"jump 7\r");
        // Up arrow recalls, CR re-dispatches the recalled line.
        feed(&mut shell, &queue, b"\x1b[A\r");

        assert_eq!(probe.calls().len(), 2);
        assert_eq!(probe.calls()[1].arg1, 7);
        // The recall erased and redrew the line.
        assert!(con.output().contains("\x1b[2K\x1b[0G"));
    }

    #[test]
    fn down_arrow_past_newest_clears_the_line() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "jump",
            usage: "",
            summary: "",
            defaults: &[],
            handler: &probe,
        }];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        feed(&mut shell, &queue, b"jump 7\r\x1b[A\x1b[B\r");

        // The final CR dispatched an empty line: only the initial command ran.
        assert_eq!(probe.calls().len(), 1);
    }

    #[test]
    fn aborted_escape_sequence_has_no_side_effects() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "jx",
            usage: "",
            summary: "",
            defaults: &[],
            handler: &probe,
        }];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        // ESC then 'x': both consumed by the sub-parser, no echo, no line content.
        feed(&mut shell, &queue, b"\x1bxjx\r");

        assert_eq!(probe.calls().len(), 1);
        assert!(!con.output().contains('^'));
    }

    #[test]
    fn control_bytes_echo_in_caret_notation() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "x",
            usage: "",
            summary: "",
            defaults: &[],
            handler: &probe,
        }];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        feed(&mut shell, &queue, &[0x01]);

        assert!(con.output().contains("^A"));
    }

    #[test]
    fn line_capacity_clamps_input_silently() {
        let queue = ByteQueue::new();
        let con = RecordingConsole::new();
        let probe = Probe::new();
        let set = [CommandSpec {
            name: "x",
            usage: "",
            summary: "",
            defaults: &[],
            handler: &probe,
        }];
        let mut shell = Shell::new(&queue, &set, &con);
        shell.greet();

        let long = [b'a'; LINE_CAPACITY + 8];
        feed(&mut shell, &queue, &long);

        // Exactly LINE_CAPACITY characters echoed; the overflow was dropped.
        assert_eq!(con.output().matches('a').count(), LINE_CAPACITY);
    }
}
