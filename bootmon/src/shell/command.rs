// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command registry, resolution and argument parsing.

use crate::console;
use core::fmt;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Command interfaces.
pub mod interface {

    /// A registered command's entry point.
    pub trait Command {
        /// Execute with the parsed arguments.
        fn execute(&self, args: &super::Args, ctx: &super::Context);
    }
}

/// Up to three numeric arguments, parsed C-style. Unfilled slots stay zero.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Args {
    /// How many arguments actually parsed.
    pub count: usize,
    pub arg1: u64,
    pub arg2: u64,
    pub arg3: u64,
}

/// A named set of default parameters for a command. Zero-valued fields are not meaningful and
/// are omitted from display.
#[derive(Copy, Clone)]
pub struct ParamSet {
    pub label: &'static str,
    pub len: u64,
    pub lba: u64,
    pub addr: u64,
}

/// An immutable command table entry.
pub struct CommandSpec<'a> {
    pub name: &'a str,
    pub usage: &'a str,
    pub summary: &'a str,
    pub defaults: &'a [ParamSet],
    pub handler: &'a (dyn interface::Command + Sync),
}

/// Everything a handler may need at execution time.
pub struct Context<'a> {
    pub commands: &'a [CommandSpec<'a>],
    pub console: &'a (dyn console::interface::All + 'a),
}

/// Result of resolving a typed name against the registry.
pub enum Resolution<'a> {
    /// No registered name starts with the candidate.
    Unknown,

    /// More than one registered name starts with the candidate. Payload is the candidate's
    /// length. An exact match among the candidates does not disambiguate.
    Ambiguous(usize),

    /// Exactly one registered name starts with the candidate.
    Found(&'a CommandSpec<'a>),
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

fn emit(con: &dyn console::interface::All, args: fmt::Arguments) {
    con.write_fmt(args).unwrap();
}

/// C `strtoul(s, _, 0)` semantics: `0x` prefix means hex, a leading `0` means octal, anything
/// else decimal. Parses the longest valid digit prefix, returns it together with the unconsumed
/// remainder, and saturates on overflow. `None` if not even one digit parsed.
fn parse_c_unsigned(s: &str) -> Option<(u64, &str)> {
    let bytes = s.as_bytes();

    let (radix, mut idx, mut digits) =
        if bytes.len() >= 3 && bytes[0] == b'0' && (bytes[1] | 0x20) == b'x' && bytes[2].is_ascii_hexdigit() {
            (16, 2, 0)
        } else if !bytes.is_empty() && bytes[0] == b'0' {
            // The leading zero already counts as one parsed (octal) digit.
            (8, 1, 1)
        } else {
            (10, 0, 0)
        };

    let mut value: u64 = 0;
    while idx < bytes.len() {
        let digit = match (bytes[idx] as char).to_digit(radix) {
            Some(d) => d as u64,
            None => break,
        };
        value = value.saturating_mul(radix as u64).saturating_add(digit);
        idx += 1;
        digits += 1;
    }

    if digits == 0 {
        return None;
    }

    Some((value, &s[idx..]))
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Resolve `line` against the registry by prefix match of its first word.
pub fn resolve<'a>(set: &'a [CommandSpec<'a>], line: &str) -> Resolution<'a> {
    let name_len = line.find(' ').unwrap_or(line.len());
    let candidate = &line[..name_len];

    let mut found = None;
    let mut count = 0;
    for spec in set {
        if spec.name.starts_with(candidate) {
            found = Some(spec);
            count += 1;
        }
    }

    match (count, found) {
        (1, Some(spec)) => Resolution::Found(spec),
        (0, _) => Resolution::Unknown,
        _ => Resolution::Ambiguous(candidate.len()),
    }
}

/// Count the registered names starting with `partial`, returning the count and the last match.
pub fn match_count<'a>(set: &'a [CommandSpec<'a>], partial: &str) -> (usize, Option<&'a str>) {
    let mut found = None;
    let mut count = 0;
    for spec in set {
        if spec.name.starts_with(partial) {
            found = Some(spec.name);
            count += 1;
        }
    }

    (count, found)
}

/// Parse up to three whitespace-separated numeric arguments following the command word.
///
/// Parsing stops at the first token that does not begin with a number, and also after any token
/// that carries a non-numeric tail glued to its digits - exactly the behavior a `strtoul` loop
/// over the raw line has.
pub fn parse_args(line: &str) -> Args {
    let mut args = Args::default();

    // Skip the command word.
    let Some(end_of_word) = line.find(|c: char| c.is_ascii_whitespace()) else {
        return args;
    };
    let mut rest = line[end_of_word..].trim_start_matches(|c: char| c.is_ascii_whitespace());

    let mut values = [0u64; 3];
    while args.count < 3 && !rest.is_empty() {
        let Some((value, tail)) = parse_c_unsigned(rest) else {
            break;
        };
        values[args.count] = value;
        args.count += 1;

        rest = tail.trim_start_matches(|c: char| c.is_ascii_whitespace());
    }

    args.arg1 = values[0];
    args.arg2 = values[1];
    args.arg3 = values[2];
    args
}

/// Print every registered command with usage and summary, then all declared default parameter
/// sets with their nonzero fields.
pub fn print_help(set: &[CommandSpec], con: &dyn console::interface::All) {
    emit(con, format_args!("Available commands:\r\n"));
    for spec in set {
        if spec.usage.is_empty() {
            emit(
                con,
                format_args!("  {:<9} - {}\r\n", spec.name, spec.summary),
            );
        } else {
            emit(
                con,
                format_args!("  {:<9} {:<11} - {}\r\n", spec.name, spec.usage, spec.summary),
            );
        }
    }

    if set.iter().all(|spec| spec.defaults.is_empty()) {
        return;
    }

    emit(con, format_args!("\r\nDefaults:\r\n"));
    for spec in set {
        for params in spec.defaults {
            emit(con, format_args!("  {:<9} {}\r\n", spec.name, params));
        }
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.label)?;

        if self.len != 0 {
            write!(f, " len={}", self.len)?;
        }
        if self.lba != 0 {
            write!(f, " lba={}", self.lba)?;
        }
        if self.addr != 0 {
            write!(f, " addr={:#010x}", self.addr)?;
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    struct Inert;
    impl interface::Command for Inert {
        fn execute(&self, _args: &Args, _ctx: &Context) {}
    }
    static INERT: Inert = Inert;

    fn spec(name: &'static str) -> CommandSpec<'static> {
        CommandSpec {
            name,
            usage: "",
            summary: "",
            defaults: &[],
            handler: &INERT,
        }
    }

    fn registry() -> [CommandSpec<'static>; 4] {
        [spec("help"), spec("print_ddr"), spec("load_sd"), spec("jump")]
    }

    #[test]
    fn unambiguous_prefix_resolves() {
        let set = registry();

        for candidate in ["j", "ju", "jump", "jump 100", "p", "print_ddr 4 0x100"] {
            match resolve(&set, candidate) {
                Resolution::Found(_) => {}
                _ => panic!("'{}' should resolve", candidate),
            }
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let set = registry();

        assert!(matches!(resolve(&set, "wat"), Resolution::Unknown));
        assert!(matches!(resolve(&set, "jumped"), Resolution::Unknown));
    }

    #[test]
    fn shared_prefix_is_ambiguous() {
        let set = [spec("load"), spec("load_sd")];

        assert!(matches!(resolve(&set, "lo"), Resolution::Ambiguous(2)));
    }

    #[test]
    fn exact_name_among_ambiguous_candidates_stays_ambiguous() {
        let set = [spec("load"), spec("load_sd")];

        // "load" names one command exactly, but it also prefixes "load_sd". No execution.
        assert!(matches!(resolve(&set, "load"), Resolution::Ambiguous(4)));
        assert!(matches!(resolve(&set, "load 1 2"), Resolution::Ambiguous(4)));
    }

    #[test]
    fn decimal_hex_and_octal_arguments() {
        let args = parse_args("load_sd 10 0x380 017");

        assert_eq!(
            args,
            Args {
                count: 3,
                arg1: 10,
                arg2: 0x380,
                arg3: 0o17,
            }
        );
    }

    #[test]
    fn spec_example_load_sd_parses_all_three() {
        let args = parse_args("load_sd 10 896 3221225472");

        assert_eq!(args.count, 3);
        assert_eq!(args.arg1, 10);
        assert_eq!(args.arg2, 896);
        assert_eq!(args.arg3, 3_221_225_472);
    }

    #[test]
    fn parsing_stops_at_the_first_non_number() {
        let args = parse_args("cmd 1 x 3");

        assert_eq!(
            args,
            Args {
                count: 1,
                arg1: 1,
                arg2: 0,
                arg3: 0,
            }
        );
    }

    #[test]
    fn glued_garbage_keeps_the_digit_prefix_then_stops() {
        // strtoul reads "12", leaves "ab", and the next round fails on "ab".
        let args = parse_args("cmd 12ab 7");

        assert_eq!(args.count, 1);
        assert_eq!(args.arg1, 12);
    }

    #[test]
    fn no_arguments_yields_zeroes() {
        assert_eq!(parse_args("help"), Args::default());
        assert_eq!(parse_args("help   "), Args::default());
    }

    #[test]
    fn a_fourth_argument_is_ignored() {
        let args = parse_args("cmd 1 2 3 4");

        assert_eq!(args.count, 3);
        assert_eq!(args.arg3, 3);
    }

    #[test]
    fn lone_zero_parses_as_zero() {
        let args = parse_args("cmd 0");

        assert_eq!(args.count, 1);
        assert_eq!(args.arg1, 0);
    }

    #[test]
    fn overflow_saturates() {
        let args = parse_args("cmd 99999999999999999999999999");

        assert_eq!(args.count, 1);
        assert_eq!(args.arg1, u64::MAX);
    }

    #[test]
    fn param_set_displays_nonzero_fields_only() {
        let params = ParamSet {
            label: "kernel",
            len: 16384,
            lba: 2048,
            addr: 0x20_0000,
        };
        assert_eq!(
            params.to_string(),
            "kernel: len=16384 lba=2048 addr=0x00200000"
        );

        let entry_only = ParamSet {
            label: "entry",
            len: 0,
            lba: 0,
            addr: 0x20_0000,
        };
        assert_eq!(entry_only.to_string(), "entry: addr=0x00200000");
    }
}
