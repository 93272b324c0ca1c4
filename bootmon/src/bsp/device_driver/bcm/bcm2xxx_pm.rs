// SPDX-License-Identifier: MIT OR Apache-2.0

//! PM Driver - power management and watchdog.
//!
//! Only used for one thing: the `reset` command's full chip reset, done by arming the watchdog
//! with a near-zero count.

use crate::{bsp::device_driver::common::MMIODerefWrapper, cpu, driver};
use tock_registers::{
    interfaces::Writeable,
    register_bitfields, register_structs,
    registers::ReadWrite,
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

// PM registers. Writes take effect only with the password in the top byte.
register_bitfields! {
    u32,

    /// Reset Control.
    RSTC [
        PASSWORD OFFSET(24) NUMBITS(8) [],

        WRCFG OFFSET(4) NUMBITS(2) [
            FullReset = 0b10
        ]
    ],

    /// Watchdog counter.
    WDOG [
        PASSWORD OFFSET(24) NUMBITS(8) [],

        /// Ticks until the watchdog fires.
        TIME OFFSET(0) NUMBITS(20) []
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => _reserved1),
        (0x1c => RSTC: ReadWrite<u32, RSTC::Register>),
        (0x20 => _reserved2),
        (0x24 => WDOG: ReadWrite<u32, WDOG::Register>),
        (0x28 => @END),
    }
}

/// Abstraction for the associated MMIO registers.
type Registers = MMIODerefWrapper<RegisterBlock>;

const PASSWORD: u32 = 0x5A;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Representation of the PM block.
pub struct PM {
    registers: Registers,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl PM {
    pub const COMPATIBLE: &'static str = "BCM PM (watchdog)";

    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO start address.
    pub const unsafe fn new(mmio_start_addr: usize) -> Self {
        Self {
            registers: Registers::new(mmio_start_addr),
        }
    }

    /// Arm the watchdog for a full chip reset and wait for it to fire.
    pub fn system_reset(&self) -> ! {
        self.registers
            .WDOG
            .write(WDOG::PASSWORD.val(PASSWORD) + WDOG::TIME.val(10));
        self.registers
            .RSTC
            .write(RSTC::PASSWORD.val(PASSWORD) + RSTC::WRCFG::FullReset);

        cpu::wait_forever()
    }
}

//------------------------------------------------------------------------------
// OS Interface Code
//------------------------------------------------------------------------------

impl driver::interface::DeviceDriver for PM {
    type IRQNumberType = crate::bsp::device_driver::IRQNumber;

    fn compatible(&self) -> &'static str {
        Self::COMPATIBLE
    }
}
