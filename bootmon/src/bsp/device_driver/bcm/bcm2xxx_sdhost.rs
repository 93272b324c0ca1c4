// SPDX-License-Identifier: MIT OR Apache-2.0

//! SDHOST Driver - the BCM's legacy SD card controller.
//!
//! Implements the narrow storage interface of the load path: a blocking, polled, multi-block
//! read with an upper-bound timeout, plus a readiness poll. No interrupts are used; the load
//! path runs the whole transfer inside a critical section anyway, so polled PIO is the honest
//! implementation.
//!
//! Card bring-up follows the standard identification dance: GO_IDLE, SEND_IF_COND, ACMD41 until
//! powered up, ALL_SEND_CID, SEND_RELATIVE_ADDR, SELECT_CARD, 4-bit bus, 512-byte blocks.

use crate::{
    bsp::device_driver::common::MMIODerefWrapper,
    cpu, driver, loader, synchronization,
    synchronization::IRQSafeNullLock,
    time,
};
use core::time::Duration;
use tock_registers::{
    interfaces::{Readable, Writeable},
    register_bitfields, register_structs,
    registers::{ReadOnly, ReadWrite},
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

// SDHOST registers.
register_bitfields! {
    u32,

    /// Command register.
    CMD [
        /// Set to latch a new command; the controller clears it when the command completed.
        NEW OFFSET(15) NUMBITS(1) [],

        /// The previous command failed.
        FAIL OFFSET(14) NUMBITS(1) [],

        /// The command expects a busy signal on DAT0.
        BUSY OFFSET(11) NUMBITS(1) [],

        /// The command has no response.
        NO_RESPONSE OFFSET(10) NUMBITS(1) [],

        /// The command has a 136-bit response.
        LONG_RESPONSE OFFSET(9) NUMBITS(1) [],

        /// The command writes data to the card.
        WRITE_CMD OFFSET(7) NUMBITS(1) [],

        /// The command reads data from the card.
        READ_CMD OFFSET(6) NUMBITS(1) [],

        /// SD command index.
        COMMAND OFFSET(0) NUMBITS(6) []
    ],

    /// Host status register. Error bits are write-1-to-clear.
    HSTS [
        REW_TIME_OUT OFFSET(7) NUMBITS(1) [],
        CMD_TIME_OUT OFFSET(6) NUMBITS(1) [],
        CRC16_ERROR OFFSET(5) NUMBITS(1) [],
        CRC7_ERROR OFFSET(4) NUMBITS(1) [],
        FIFO_ERROR OFFSET(3) NUMBITS(1) [],

        /// The data FIFO holds at least one word.
        DATA_FLAG OFFSET(0) NUMBITS(1) []
    ],

    /// Debug register, exposing the controller's state machine and FIFO fill level.
    EDM [
        /// Number of words in the data FIFO.
        FIFO_COUNT OFFSET(4) NUMBITS(5) [],

        /// Controller state machine.
        STATE OFFSET(0) NUMBITS(4) [
            Identification = 0,
            DataMode = 1
        ]
    ],

    /// Host configuration.
    HCFG [
        /// Use all four data lines.
        WIDE_EXT_BUS OFFSET(2) NUMBITS(1) [],

        /// Use the full-width internal data path.
        WIDE_INT_BUS OFFSET(1) NUMBITS(1) [],

        /// Hold off new commands while the card signals busy.
        SLOW_CARD OFFSET(3) NUMBITS(1) []
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => CMD: ReadWrite<u32, CMD::Register>),
        (0x04 => ARG: ReadWrite<u32>),
        (0x08 => TOUT: ReadWrite<u32>),
        (0x0c => CDIV: ReadWrite<u32>),
        (0x10 => RSP0: ReadOnly<u32>),
        (0x14 => RSP1: ReadOnly<u32>),
        (0x18 => RSP2: ReadOnly<u32>),
        (0x1c => RSP3: ReadOnly<u32>),
        (0x20 => HSTS: ReadWrite<u32, HSTS::Register>),
        (0x24 => _reserved1),
        (0x30 => VDD: ReadWrite<u32>),
        (0x34 => EDM: ReadWrite<u32, EDM::Register>),
        (0x38 => HCFG: ReadWrite<u32, HCFG::Register>),
        (0x3c => HBCT: ReadWrite<u32>),
        (0x40 => DATA: ReadWrite<u32>),
        (0x44 => _reserved2),
        (0x50 => HBLC: ReadWrite<u32>),
        (0x54 => @END),
    }
}

/// Abstraction for the associated MMIO registers.
type Registers = MMIODerefWrapper<RegisterBlock>;

/// SD command indices.
mod cmd_index {
    pub const GO_IDLE_STATE: u32 = 0;
    pub const ALL_SEND_CID: u32 = 2;
    pub const SEND_RELATIVE_ADDR: u32 = 3;
    pub const SELECT_CARD: u32 = 7;
    pub const SEND_IF_COND: u32 = 8;
    pub const STOP_TRANSMISSION: u32 = 12;
    pub const SET_BLOCKLEN: u32 = 16;
    pub const READ_SINGLE_BLOCK: u32 = 17;
    pub const READ_MULTIPLE_BLOCK: u32 = 18;
    pub const APP_CMD: u32 = 55;

    // Application commands, after APP_CMD.
    pub const ACMD_SET_BUS_WIDTH: u32 = 6;
    pub const ACMD_SD_SEND_OP_COND: u32 = 41;
}

/// Per-command completion timeout.
const COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// ACMD41 voltage window + high-capacity request.
const OP_COND_ARG: u32 = 0x40FF_8000;

/// ACMD41 response: card finished power-up.
const OP_COND_READY: u32 = 1 << 31;

/// ACMD41 response: card is high capacity (block addressing).
const OP_COND_HIGH_CAPACITY: u32 = 1 << 30;

struct SDHostInner {
    registers: Registers,
    rca: u32,
    high_capacity: bool,
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Representation of the SDHOST controller with the attached card.
pub struct SDHost {
    inner: IRQSafeNullLock<SDHostInner>,
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

impl SDHostInner {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO start address.
    const unsafe fn new(mmio_start_addr: usize) -> Self {
        Self {
            registers: Registers::new(mmio_start_addr),
            rca: 0,
            high_capacity: false,
        }
    }

    /// Spin until `NEW` clears, meaning the controller accepted and finished the latched
    /// command, or until the deadline passes.
    fn wait_command_done(&self) -> Result<(), &'static str> {
        let deadline = time::time_manager().uptime() + COMMAND_TIMEOUT;

        while self.registers.CMD.matches_all(CMD::NEW::SET) {
            if time::time_manager().uptime() > deadline {
                return Err("Timeout waiting for SD command completion");
            }
            cpu::nop();
        }

        Ok(())
    }

    /// Latch one SD command and wait for its completion.
    fn command(
        &mut self,
        index: u32,
        arg: u32,
        flags: tock_registers::fields::FieldValue<u32, CMD::Register>,
    ) -> Result<(), &'static str> {
        self.wait_command_done()?;

        // Error bits are sticky; clear leftovers from the previous command.
        self.registers.HSTS.set(u32::MAX);

        self.registers.ARG.set(arg);
        self.registers
            .CMD
            .write(CMD::NEW::SET + CMD::COMMAND.val(index) + flags);

        self.wait_command_done()?;

        if self.registers.CMD.matches_all(CMD::FAIL::SET) {
            return Err("SD command failed");
        }

        // FIFO_ERROR through REW_TIME_OUT.
        const HSTS_ERROR_MASK: u32 = 0b1111_1000;
        if self.registers.HSTS.get() & HSTS_ERROR_MASK != 0 {
            return Err("SD command completed with error status");
        }

        Ok(())
    }

    /// Short response of the last command.
    fn response(&self) -> u32 {
        self.registers.RSP0.get()
    }

    /// Latch an application command (CMD55 prefix).
    fn app_command(
        &mut self,
        index: u32,
        arg: u32,
        flags: tock_registers::fields::FieldValue<u32, CMD::Register>,
    ) -> Result<(), &'static str> {
        self.command(cmd_index::APP_CMD, self.rca << 16, CMD::NEW::CLEAR)?;
        self.command(index, arg, flags)
    }

    /// Power the controller and identify the card.
    fn init(&mut self) -> Result<(), &'static str> {
        // Power off, configure, power on. The slow divisor keeps the identification phase
        // within the 400 kHz the spec demands.
        self.registers.VDD.set(0);
        self.registers
            .HCFG
            .write(HCFG::WIDE_INT_BUS::SET + HCFG::SLOW_CARD::SET);
        self.registers.CDIV.set(0x148);
        self.registers.TOUT.set(0x00F0_0000);
        self.registers.VDD.set(1);
        time::time_manager().spin_for(Duration::from_millis(20));

        self.command(cmd_index::GO_IDLE_STATE, 0, CMD::NO_RESPONSE::SET)?;

        // Voltage check. 2.7-3.6 V window, echo pattern 0xAA.
        self.command(cmd_index::SEND_IF_COND, 0x1AA, CMD::NEW::CLEAR)?;
        if self.response() & 0xFFF != 0x1AA {
            return Err("SD card voltage check failed");
        }

        // Repeat ACMD41 until the card reports power-up completion.
        let deadline = time::time_manager().uptime() + Duration::from_secs(1);
        loop {
            self.app_command(cmd_index::ACMD_SD_SEND_OP_COND, OP_COND_ARG, CMD::NEW::CLEAR)?;

            let ocr = self.response();
            if ocr & OP_COND_READY != 0 {
                self.high_capacity = ocr & OP_COND_HIGH_CAPACITY != 0;
                break;
            }

            if time::time_manager().uptime() > deadline {
                return Err("SD card stuck in power-up");
            }
            time::time_manager().spin_for(Duration::from_millis(10));
        }

        // Identification and selection.
        self.command(cmd_index::ALL_SEND_CID, 0, CMD::LONG_RESPONSE::SET)?;
        self.command(cmd_index::SEND_RELATIVE_ADDR, 0, CMD::NEW::CLEAR)?;
        self.rca = self.response() >> 16;
        self.command(cmd_index::SELECT_CARD, self.rca << 16, CMD::BUSY::SET)?;

        // 4-bit bus, 512-byte blocks, full-speed divisor.
        self.app_command(cmd_index::ACMD_SET_BUS_WIDTH, 2, CMD::NEW::CLEAR)?;
        self.registers.HCFG.write(
            HCFG::WIDE_INT_BUS::SET + HCFG::WIDE_EXT_BUS::SET + HCFG::SLOW_CARD::SET,
        );
        self.command(
            cmd_index::SET_BLOCKLEN,
            loader::BLOCK_SIZE as u32,
            CMD::NEW::CLEAR,
        )?;
        self.registers.CDIV.set(0x4);

        Ok(())
    }

    /// Blocking PIO multi-block read.
    fn read_blocks(
        &mut self,
        lba: u64,
        blocks: u32,
        dest: usize,
        timeout: Duration,
    ) -> Result<(), &'static str> {
        let deadline = time::time_manager().uptime() + timeout;

        self.registers.HBCT.set(loader::BLOCK_SIZE as u32);
        self.registers.HBLC.set(blocks);

        // Standard-capacity cards address by byte, high-capacity ones by block.
        let addr = if self.high_capacity {
            lba as u32
        } else {
            (lba as u32) * loader::BLOCK_SIZE as u32
        };

        let index = if blocks > 1 {
            cmd_index::READ_MULTIPLE_BLOCK
        } else {
            cmd_index::READ_SINGLE_BLOCK
        };
        self.command(index, addr, CMD::READ_CMD::SET)?;

        let mut ptr = dest as *mut u32;
        let words = blocks as usize * (loader::BLOCK_SIZE / 4);
        for _ in 0..words {
            // Wait for the FIFO to offer a word.
            while !self.registers.HSTS.matches_all(HSTS::DATA_FLAG::SET) {
                if time::time_manager().uptime() > deadline {
                    return Err("Timeout waiting for SD read data");
                }
                cpu::nop();
            }

            let word = self.registers.DATA.get();
            // SAFETY: The caller of the BlockDevice interface vouches for the destination
            // range; see `loader::interface::BlockDevice::read_blocks`.
            unsafe {
                ptr.write_volatile(word);
                ptr = ptr.add(1);
            }
        }

        if blocks > 1 {
            self.command(cmd_index::STOP_TRANSMISSION, 0, CMD::BUSY::SET)?;
        }

        Ok(())
    }

    /// Whether the controller is ready for the next command: nothing latched, FIFO drained,
    /// state machine back in a resting state.
    fn is_ready(&self) -> bool {
        if self.registers.CMD.matches_all(CMD::NEW::SET) {
            return false;
        }
        if self.registers.EDM.read(EDM::FIFO_COUNT) != 0 {
            return false;
        }

        matches!(
            self.registers.EDM.read_as_enum(EDM::STATE),
            Some(EDM::STATE::Value::Identification) | Some(EDM::STATE::Value::DataMode)
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl SDHost {
    pub const COMPATIBLE: &'static str = "BCM SDHOST (SD card)";

    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO start address.
    pub const unsafe fn new(mmio_start_addr: usize) -> Self {
        Self {
            inner: IRQSafeNullLock::new(SDHostInner::new(mmio_start_addr)),
        }
    }
}

//------------------------------------------------------------------------------
// OS Interface Code
//------------------------------------------------------------------------------
use synchronization::interface::Mutex;

impl driver::interface::DeviceDriver for SDHost {
    type IRQNumberType = crate::bsp::device_driver::IRQNumber;

    fn compatible(&self) -> &'static str {
        Self::COMPATIBLE
    }

    unsafe fn init(&self) -> Result<(), &'static str> {
        self.inner.lock(|inner| inner.init())
    }
}

impl loader::interface::BlockDevice for SDHost {
    unsafe fn read_blocks(
        &self,
        lba: u64,
        blocks: u32,
        dest: usize,
        timeout: Duration,
    ) -> Result<(), &'static str> {
        self.inner
            .lock(|inner| inner.read_blocks(lba, blocks, dest, timeout))
    }

    fn is_ready(&self) -> bool {
        self.inner.lock(|inner| inner.is_ready())
    }
}
