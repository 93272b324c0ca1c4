// SPDX-License-Identifier: MIT OR Apache-2.0

//! GPIO Driver.
//!
//! Pin-muxing for the UART and the SD host, plus the activity LED the heartbeat and the fatal
//! halt blink with.

use crate::{
    bsp::device_driver::common::MMIODerefWrapper,
    driver, synchronization,
    synchronization::IRQSafeNullLock,
};
use tock_registers::{
    interfaces::{ReadWriteable, Writeable},
    register_bitfields, register_structs,
    registers::{ReadWrite, WriteOnly},
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

// GPIO registers.
//
// Descriptions taken from "BCM2711 ARM Peripherals", section 5.
register_bitfields! {
    u32,

    /// GPIO Function Select 1
    GPFSEL1 [
        /// Pin 15
        FSEL15 OFFSET(15) NUMBITS(3) [
            Input = 0b000,
            Output = 0b001,
            AltFunc0 = 0b100  // PL011 UART RX
        ],

        /// Pin 14
        FSEL14 OFFSET(12) NUMBITS(3) [
            Input = 0b000,
            Output = 0b001,
            AltFunc0 = 0b100  // PL011 UART TX
        ]
    ],

    /// GPIO Function Select 4
    GPFSEL4 [
        /// Pin 49
        FSEL49 OFFSET(27) NUMBITS(3) [
            Input = 0b000,
            Output = 0b001,
            AltFunc0 = 0b100  // SD1 CMD
        ],

        /// Pin 48
        FSEL48 OFFSET(24) NUMBITS(3) [
            Input = 0b000,
            Output = 0b001,
            AltFunc0 = 0b100  // SD1 CLK
        ],

        /// Pin 42 - the activity LED.
        FSEL42 OFFSET(6) NUMBITS(3) [
            Input = 0b000,
            Output = 0b001
        ]
    ],

    /// GPIO Function Select 5
    GPFSEL5 [
        /// Pin 53
        FSEL53 OFFSET(9) NUMBITS(3) [
            Input = 0b000,
            AltFunc0 = 0b100  // SD1 DAT3
        ],

        /// Pin 52
        FSEL52 OFFSET(6) NUMBITS(3) [
            Input = 0b000,
            AltFunc0 = 0b100  // SD1 DAT2
        ],

        /// Pin 51
        FSEL51 OFFSET(3) NUMBITS(3) [
            Input = 0b000,
            AltFunc0 = 0b100  // SD1 DAT1
        ],

        /// Pin 50
        FSEL50 OFFSET(0) NUMBITS(3) [
            Input = 0b000,
            AltFunc0 = 0b100  // SD1 DAT0
        ]
    ],

    /// GPIO Pull-up/down Control Register 0
    GPIO_PUP_PDN_CNTRL_REG0 [
        /// Pin 15
        GPIO_PUP_PDN_CNTRL15 OFFSET(30) NUMBITS(2) [
            NoResistor = 0b00,
            PullUp = 0b01
        ],

        /// Pin 14
        GPIO_PUP_PDN_CNTRL14 OFFSET(28) NUMBITS(2) [
            NoResistor = 0b00,
            PullUp = 0b01
        ]
    ],

    /// GPIO Pull-up/down Control Register 3
    GPIO_PUP_PDN_CNTRL_REG3 [
        /// Pin 53
        GPIO_PUP_PDN_CNTRL53 OFFSET(10) NUMBITS(2) [
            NoResistor = 0b00,
            PullUp = 0b01
        ],

        /// Pin 52
        GPIO_PUP_PDN_CNTRL52 OFFSET(8) NUMBITS(2) [
            NoResistor = 0b00,
            PullUp = 0b01
        ],

        /// Pin 51
        GPIO_PUP_PDN_CNTRL51 OFFSET(6) NUMBITS(2) [
            NoResistor = 0b00,
            PullUp = 0b01
        ],

        /// Pin 50
        GPIO_PUP_PDN_CNTRL50 OFFSET(4) NUMBITS(2) [
            NoResistor = 0b00,
            PullUp = 0b01
        ]
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => _reserved1),
        (0x04 => GPFSEL1: ReadWrite<u32, GPFSEL1::Register>),
        (0x08 => _reserved2),
        (0x10 => GPFSEL4: ReadWrite<u32, GPFSEL4::Register>),
        (0x14 => GPFSEL5: ReadWrite<u32, GPFSEL5::Register>),
        (0x18 => _reserved3),
        (0x20 => GPSET1: WriteOnly<u32>),
        (0x24 => _reserved4),
        (0x2c => GPCLR1: WriteOnly<u32>),
        (0x30 => _reserved5),
        (0xe4 => GPIO_PUP_PDN_CNTRL_REG0: ReadWrite<u32, GPIO_PUP_PDN_CNTRL_REG0::Register>),
        (0xe8 => _reserved6),
        (0xf0 => GPIO_PUP_PDN_CNTRL_REG3: ReadWrite<u32, GPIO_PUP_PDN_CNTRL_REG3::Register>),
        (0xf4 => @END),
    }
}

/// Abstraction for the associated MMIO registers.
type Registers = MMIODerefWrapper<RegisterBlock>;

struct GPIOInner {
    registers: Registers,
    led_on: bool,
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Representation of the GPIO HW.
pub struct GPIO {
    inner: IRQSafeNullLock<GPIOInner>,
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

/// GPSET1/GPCLR1 cover pins 32..=57; the activity LED sits on pin 42.
const LED_BANK1_BIT: u32 = 1 << (42 - 32);

impl GPIOInner {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO start address.
    const unsafe fn new(mmio_start_addr: usize) -> Self {
        Self {
            registers: Registers::new(mmio_start_addr),
            led_on: false,
        }
    }

    /// Map PL011 UART as standard output.
    ///
    /// TX to pin 14, RX to pin 15.
    fn map_pl011_uart(&mut self) {
        // Select the UART on pins 14 and 15.
        self.registers
            .GPFSEL1
            .modify(GPFSEL1::FSEL15::AltFunc0 + GPFSEL1::FSEL14::AltFunc0);

        // Disable pull-up/down on pins 14 and 15.
        self.registers.GPIO_PUP_PDN_CNTRL_REG0.modify(
            GPIO_PUP_PDN_CNTRL_REG0::GPIO_PUP_PDN_CNTRL15::NoResistor
                + GPIO_PUP_PDN_CNTRL_REG0::GPIO_PUP_PDN_CNTRL14::NoResistor,
        );
    }

    /// Map the SD host controller to pins 48-53.
    fn map_sdhost(&mut self) {
        // CLK and CMD.
        self.registers
            .GPFSEL4
            .modify(GPFSEL4::FSEL48::AltFunc0 + GPFSEL4::FSEL49::AltFunc0);

        // DAT0-DAT3, with pull-ups on the data lines.
        self.registers.GPFSEL5.modify(
            GPFSEL5::FSEL50::AltFunc0
                + GPFSEL5::FSEL51::AltFunc0
                + GPFSEL5::FSEL52::AltFunc0
                + GPFSEL5::FSEL53::AltFunc0,
        );
        self.registers.GPIO_PUP_PDN_CNTRL_REG3.modify(
            GPIO_PUP_PDN_CNTRL_REG3::GPIO_PUP_PDN_CNTRL50::PullUp
                + GPIO_PUP_PDN_CNTRL_REG3::GPIO_PUP_PDN_CNTRL51::PullUp
                + GPIO_PUP_PDN_CNTRL_REG3::GPIO_PUP_PDN_CNTRL52::PullUp
                + GPIO_PUP_PDN_CNTRL_REG3::GPIO_PUP_PDN_CNTRL53::PullUp,
        );
    }

    /// Configure the activity LED pin as an output, LED off.
    fn init_activity_led(&mut self) {
        self.registers.GPFSEL4.modify(GPFSEL4::FSEL42::Output);
        self.registers.GPCLR1.set(LED_BANK1_BIT);
        self.led_on = false;
    }

    fn toggle_activity_led(&mut self) {
        if self.led_on {
            self.registers.GPCLR1.set(LED_BANK1_BIT);
        } else {
            self.registers.GPSET1.set(LED_BANK1_BIT);
        }
        self.led_on = !self.led_on;
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl GPIO {
    pub const COMPATIBLE: &'static str = "BCM GPIO";

    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO start address.
    pub const unsafe fn new(mmio_start_addr: usize) -> Self {
        Self {
            inner: IRQSafeNullLock::new(GPIOInner::new(mmio_start_addr)),
        }
    }

    /// Concurrency safe version of `GPIOInner.map_pl011_uart()`.
    pub fn map_pl011_uart(&self) {
        self.inner.lock(|inner| inner.map_pl011_uart())
    }

    /// Concurrency safe version of `GPIOInner.map_sdhost()`.
    pub fn map_sdhost(&self) {
        self.inner.lock(|inner| inner.map_sdhost())
    }

    /// Concurrency safe version of `GPIOInner.init_activity_led()`.
    pub fn init_activity_led(&self) {
        self.inner.lock(|inner| inner.init_activity_led())
    }

    /// Flip the activity LED.
    pub fn toggle_activity_led(&self) {
        self.inner.lock(|inner| inner.toggle_activity_led())
    }
}

//------------------------------------------------------------------------------
// OS Interface Code
//------------------------------------------------------------------------------
use synchronization::interface::Mutex;

impl driver::interface::DeviceDriver for GPIO {
    type IRQNumberType = crate::bsp::device_driver::IRQNumber;

    fn compatible(&self) -> &'static str {
        Self::COMPATIBLE
    }
}
