// SPDX-License-Identifier: MIT OR Apache-2.0

//! The board's operator command table.
//!
//! Assembles the generic command handlers with this board's drivers, memory map and default
//! parameter sets, and adds the board-specific `reset` command.

use super::{driver, memory, memory::map::dram};
use crate::shell::command::{interface, Args, CommandSpec, Context, ParamSet};
use crate::shell::commands::{BootDefault, Help, Jump, Load, PrintMemory};
use crate::{exception, handoff, memory as generic_memory};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

/// `reset` - restart the monitor through the watchdog.
struct Reset;

/// The real hand-off teardown, backed by arch and driver code.
struct Hardware;

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

static LOAD_DEFAULTS: [ParamSet; 2] = [
    ParamSet {
        label: "kernel",
        len: dram::KERNEL_LEN_BLOCKS,
        lba: dram::KERNEL_LBA,
        addr: dram::KERNEL_ADDR as u64,
    },
    ParamSet {
        label: "dtb",
        len: dram::DTB_LEN_BLOCKS,
        lba: dram::DTB_LBA,
        addr: dram::DTB_ADDR as u64,
    },
];

static PRINT_DEFAULT: ParamSet = ParamSet {
    label: "entry",
    len: 128,
    lba: 0,
    addr: dram::DEFAULT_ENTRY as u64,
};
static PRINT_DEFAULTS: [ParamSet; 1] = [PRINT_DEFAULT];

static JUMP_DEFAULTS: [ParamSet; 1] = [ParamSet {
    label: "entry",
    len: 0,
    lba: 0,
    addr: dram::DEFAULT_ENTRY as u64,
}];

static HARDWARE: Hardware = Hardware;
static HELP: Help = Help;
static RESET: Reset = Reset;
static LOAD: Load = Load::new(&driver::SD_HOST, memory::load_window(), &LOAD_DEFAULTS);
static PRINT: PrintMemory = PrintMemory::new(&PRINT_DEFAULT);
static JUMP: Jump = Jump::new(&HARDWARE, dram::LOAD_WINDOW_START, dram::DEFAULT_ENTRY);
static BOOT: BootDefault = BootDefault::new(
    &driver::SD_HOST,
    memory::load_window(),
    &LOAD_DEFAULTS,
    &HARDWARE,
    dram::DEFAULT_ENTRY,
);

static COMMANDS: [CommandSpec<'static>; 6] = [
    CommandSpec {
        name: "help",
        usage: "",
        summary: "Display this help message",
        defaults: &[],
        handler: &HELP,
    },
    CommandSpec {
        name: "reset",
        usage: "",
        summary: "Restart the monitor via the watchdog",
        defaults: &[],
        handler: &RESET,
    },
    CommandSpec {
        name: "load_sd",
        usage: "[N [L [M]]]",
        summary: "Load N blocks from SD LBA L to address M",
        defaults: &LOAD_DEFAULTS,
        handler: &LOAD,
    },
    CommandSpec {
        name: "print_ddr",
        usage: "[N [L]]",
        summary: "Print N words of memory at address L",
        defaults: &PRINT_DEFAULTS,
        handler: &PRINT,
    },
    CommandSpec {
        name: "jump",
        usage: "[L]",
        summary: "Jump to address L",
        defaults: &JUMP_DEFAULTS,
        handler: &JUMP,
    },
    CommandSpec {
        name: "boot",
        usage: "",
        summary: "Load kernel and dtb, then jump",
        defaults: &[],
        handler: &BOOT,
    },
];

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

impl interface::Command for Reset {
    fn execute(&self, _args: &Args, ctx: &Context) {
        ctx.console
            .write_fmt(format_args!("Resetting ...\r\n"))
            .unwrap();
        ctx.console.flush();

        driver::PM.system_reset()
    }
}

impl handoff::interface::Platform for Hardware {
    fn mask_interrupts(&self) {
        exception::asynchronous::local_irq_fiq_mask();
    }

    fn invalidate_tlb(&self) {
        generic_memory::mmu::invalidate_tlb();
    }

    fn disable_translation(&self) {
        // SAFETY: The monitor is linked to physical addresses; execution continues seamlessly
        // with translation off.
        unsafe { generic_memory::mmu::disable() };
    }

    fn clean_data_cache(&self) {
        generic_memory::cache::clean_data_cache_all();
    }

    fn invalidate_instruction_cache(&self) {
        generic_memory::cache::invalidate_instruction_cache_all();
    }

    fn disable_caches(&self) {
        // SAFETY: The data cache was cleaned in the preceding step.
        unsafe { generic_memory::cache::disable() };
    }

    fn quiesce_interrupt_controller(&self) {
        driver::INTERRUPT_CONTROLLER.quiesce();
    }

    unsafe fn jump(&self, target: usize) -> ! {
        crate::cpu::branch_to_raw_addr(target)
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// The board's command table.
pub fn command_set() -> &'static [CommandSpec<'static>] {
    &COMMANDS
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::command::{match_count, resolve, Resolution};

    #[test]
    fn every_command_resolves_by_single_letter() {
        // All six names start with distinct letters, so the shortest abbreviation works.
        for (letter, name) in [
            ("h", "help"),
            ("r", "reset"),
            ("l", "load_sd"),
            ("p", "print_ddr"),
            ("j", "jump"),
            ("b", "boot"),
        ] {
            match resolve(command_set(), letter) {
                Resolution::Found(spec) => assert_eq!(spec.name, name),
                _ => panic!("'{}' should resolve to {}", letter, name),
            }
        }
    }

    #[test]
    fn spec_completion_example() {
        let (count, name) = match_count(command_set(), "pr");

        assert_eq!(count, 1);
        assert_eq!(name, Some("print_ddr"));
    }

    #[test]
    fn load_declares_kernel_and_dtb_defaults() {
        let spec = match resolve(command_set(), "load_sd") {
            Resolution::Found(spec) => spec,
            _ => panic!("load_sd must resolve"),
        };

        assert_eq!(spec.defaults.len(), 2);
        assert_eq!(spec.defaults[0].label, "kernel");
        assert_eq!(spec.defaults[1].label, "dtb");
    }
}
