// SPDX-License-Identifier: MIT OR Apache-2.0

//! BSP Memory Map.

use crate::memory::Region;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// The board's physical memory map.
#[rustfmt::skip]
pub(crate) mod map {
    /// Exclusive end of the boot core's stack. The monitor image itself is linked right here.
    pub const BOOT_CORE_STACK_END: usize = 0x8_0000;

    /// DRAM available for loading images. Starts above the monitor's own image so that a load
    /// cannot overwrite the code performing it.
    pub mod dram {
        pub const LOAD_WINDOW_START:         usize = 0x0010_0000;
        pub const LOAD_WINDOW_END_INCLUSIVE: usize = 0x3B3F_FFFF;

        /// Entry point of the default payload.
        pub const DEFAULT_ENTRY:             usize = 0x0020_0000;

        /// Default kernel image: 8 MiB starting at SD block 2048.
        pub const KERNEL_LEN_BLOCKS: u64 = 16384;
        pub const KERNEL_LBA:        u64 = 2048;
        pub const KERNEL_ADDR:     usize = DEFAULT_ENTRY;

        /// Default device-tree image.
        pub const DTB_LEN_BLOCKS: u64 = 128;
        pub const DTB_LBA:        u64 = 20480;
        pub const DTB_ADDR:     usize = 0x0300_0000;
    }

    /// Physical devices.
    pub mod mmio {
        pub const START:            usize =         0xFE00_0000;
        pub const PM_START:         usize = START + 0x0010_0000;
        pub const GPIO_START:       usize = START + 0x0020_0000;
        pub const PL011_UART_START: usize = START + 0x0020_1000;
        pub const SDHOST_START:     usize = START + 0x0020_2000;
        pub const GICD_START:       usize =         0xFF84_1000;
        pub const GICC_START:       usize =         0xFF84_2000;
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// The DRAM window that block loads may target.
pub const fn load_window() -> Region {
    Region::new(
        map::dram::LOAD_WINDOW_START,
        map::dram::LOAD_WINDOW_END_INCLUSIVE,
    )
}
