// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic monitor commands.
//!
//! Board-independent handlers, wired to their collaborators through the narrow subsystem
//! interfaces. The board's command table in the BSP owns the instances.

use super::command::{interface, Args, Context, ParamSet};
use crate::{handoff, loader, loader::LoadRequest, memory, memory::Region};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// `help` - list every registered command.
pub struct Help;

/// `load_sd` - copy blocks from the storage device into the DRAM load window.
pub struct Load<'a> {
    device: &'a (dyn loader::interface::BlockDevice + Sync),
    window: Region,
    defaults: &'a [ParamSet],
}

/// `print_ddr` - hex + ASCII dump of physical memory.
pub struct PrintMemory<'a> {
    defaults: &'a ParamSet,
}

/// `jump` - hand the CPU off to a loaded image.
pub struct Jump<'a> {
    platform: &'a (dyn handoff::interface::Platform + Sync),
    minimum: usize,
    default: usize,
}

/// `boot` - load every default image, then hand off to the default entry point.
pub struct BootDefault<'a> {
    device: &'a (dyn loader::interface::BlockDevice + Sync),
    window: Region,
    images: &'a [ParamSet],
    platform: &'a (dyn handoff::interface::Platform + Sync),
    entry: usize,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl interface::Command for Help {
    fn execute(&self, _args: &Args, ctx: &Context) {
        super::command::print_help(ctx.commands, ctx.console);
    }
}

impl<'a> Load<'a> {
    /// Create an instance. The first default parameter set fills in for missing arguments.
    pub const fn new(
        device: &'a (dyn loader::interface::BlockDevice + Sync),
        window: Region,
        defaults: &'a [ParamSet],
    ) -> Self {
        Self {
            device,
            window,
            defaults,
        }
    }

    fn request(&self, args: &Args) -> LoadRequest {
        static ZERO: ParamSet = ParamSet {
            label: "",
            len: 0,
            lba: 0,
            addr: 0,
        };
        let fallback = self.defaults.first().unwrap_or(&ZERO);

        LoadRequest {
            blocks: if args.count >= 1 {
                args.arg1 as u32
            } else {
                fallback.len as u32
            },
            lba: if args.count >= 2 { args.arg2 } else { fallback.lba },
            dest: if args.count >= 3 {
                args.arg3 as usize
            } else {
                fallback.addr as usize
            },
        }
    }
}

impl interface::Command for Load<'_> {
    fn execute(&self, args: &Args, ctx: &Context) {
        loader::load(self.device, self.window, self.request(args), ctx.console);
    }
}

impl<'a> PrintMemory<'a> {
    /// Create an instance. The default parameter set supplies word count and start address.
    pub const fn new(defaults: &'a ParamSet) -> Self {
        Self { defaults }
    }
}

impl interface::Command for PrintMemory<'_> {
    fn execute(&self, args: &Args, ctx: &Context) {
        let words = if args.count >= 1 {
            args.arg1
        } else {
            self.defaults.len
        };
        let addr = if args.count >= 2 {
            args.arg2 as usize
        } else {
            self.defaults.addr as usize
        };

        // SAFETY: The operator vouches for the address; memory contents are read as plain bytes.
        let data = unsafe { core::slice::from_raw_parts(addr as *const u8, words as usize * 4) };
        memory::hexdump(ctx.console, addr, data);
    }
}

impl<'a> Jump<'a> {
    /// Create an instance.
    pub const fn new(
        platform: &'a (dyn handoff::interface::Platform + Sync),
        minimum: usize,
        default: usize,
    ) -> Self {
        Self {
            platform,
            minimum,
            default,
        }
    }
}

impl interface::Command for Jump<'_> {
    fn execute(&self, args: &Args, ctx: &Context) {
        let target = handoff::resolve_target(args.count, args.arg1, self.minimum, self.default);

        ctx.console
            .write_fmt(format_args!("Jumping to {:#010x} ...\r\n", target))
            .unwrap();
        ctx.console.flush();

        // SAFETY: One-way by design. The image at `target` was put there by the operator.
        unsafe { handoff::execute(self.platform, target) }
    }
}

impl<'a> BootDefault<'a> {
    /// Create an instance.
    pub const fn new(
        device: &'a (dyn loader::interface::BlockDevice + Sync),
        window: Region,
        images: &'a [ParamSet],
        platform: &'a (dyn handoff::interface::Platform + Sync),
        entry: usize,
    ) -> Self {
        Self {
            device,
            window,
            images,
            platform,
            entry,
        }
    }
}

impl interface::Command for BootDefault<'_> {
    fn execute(&self, _args: &Args, ctx: &Context) {
        for image in self.images {
            ctx.console
                .write_fmt(format_args!("Loading {} ...\r\n", image.label))
                .unwrap();

            loader::load(
                self.device,
                self.window,
                LoadRequest {
                    lba: image.lba,
                    blocks: image.len as u32,
                    dest: image.addr as usize,
                },
                ctx.console,
            );
        }

        ctx.console
            .write_fmt(format_args!("Jumping to {:#010x} ...\r\n", self.entry))
            .unwrap();
        ctx.console.flush();

        // SAFETY: Same contract as the `jump` command, with the default entry point.
        unsafe { handoff::execute(self.platform, self.entry) }
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;

    struct NeverDevice;
    impl loader::interface::BlockDevice for NeverDevice {
        unsafe fn read_blocks(
            &self,
            _lba: u64,
            _blocks: u32,
            _dest: usize,
            _timeout: Duration,
        ) -> Result<(), &'static str> {
            unreachable!("request mapping tests never touch the device")
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    static DEVICE: NeverDevice = NeverDevice;
    static DEFAULTS: [ParamSet; 2] = [
        ParamSet {
            label: "kernel",
            len: 16384,
            lba: 2048,
            addr: 0x20_0000,
        },
        ParamSet {
            label: "dtb",
            len: 128,
            lba: 20480,
            addr: 0x300_0000,
        },
    ];

    fn load_command() -> Load<'static> {
        Load::new(&DEVICE, Region::new(0x10_0000, 0x3fff_ffff), &DEFAULTS)
    }

    #[test]
    fn missing_arguments_fall_back_to_the_first_default_set() {
        let load = load_command();

        let request = load.request(&Args::default());
        assert_eq!(request.blocks, 16384);
        assert_eq!(request.lba, 2048);
        assert_eq!(request.dest, 0x20_0000);
    }

    #[test]
    fn provided_arguments_override_defaults_positionally() {
        let load = load_command();

        let one = load.request(&Args {
            count: 1,
            arg1: 10,
            ..Default::default()
        });
        assert_eq!((one.blocks, one.lba, one.dest), (10, 2048, 0x20_0000));

        let all = load.request(&Args {
            count: 3,
            arg1: 10,
            arg2: 896,
            arg3: 0xc000_0000,
        });
        assert_eq!((all.blocks, all.lba, all.dest), (10, 896, 0xc000_0000));
    }
}
