// SPDX-License-Identifier: MIT OR Apache-2.0

//! GICv2 Driver - ARM Generic Interrupt Controller v2.
//!
//! The GIC is split into a system-wide Distributor (GICD) and per-core CPU Interfaces (GICC).
//! The Distributor forwards the highest-priority pending interrupt to the CPU Interface, which
//! signals the core; software acknowledges via `IAR` and completes via `EOIR`.
//!
//! Besides normal IRQ management, this driver owns the distributor *quiesce* used on the boot
//! hand-off path: every line disabled, every pending bit cleared, every line moved to the
//! non-secure group, so the next image finds the controller in a known-inert state.

mod gicc;
mod gicd;

use crate::{
    bsp::device_driver::common::BoundedUsize,
    driver, exception,
    synchronization::{interface::ReadWriteEx, InitStateLock},
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

type HandlerTable = [Option<exception::asynchronous::IRQHandlerDescriptor<IRQNumber>>;
    IRQNumber::MAX_INCLUSIVE + 1];

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// The IRQ number type of this controller.
pub type IRQNumber = BoundedUsize<{ GICv2::MAX_IRQ_NUMBER }>;

/// Representation of the GIC.
pub struct GICv2 {
    /// The Distributor.
    gicd: gicd::GICD,

    /// The CPU Interface.
    gicc: gicc::GICC,

    /// Stores registered IRQ handlers. Writable only during init.
    handler_table: InitStateLock<HandlerTable>,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl GICv2 {
    /// Normally 1019, but keep it lower to save some space.
    const MAX_IRQ_NUMBER: usize = 300;

    pub const COMPATIBLE: &'static str = "GICv2 (ARM Generic Interrupt Controller v2)";

    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide correct MMIO start addresses.
    pub const unsafe fn new(gicd_mmio_start_addr: usize, gicc_mmio_start_addr: usize) -> Self {
        Self {
            gicd: gicd::GICD::new(gicd_mmio_start_addr),
            gicc: gicc::GICC::new(gicc_mmio_start_addr),
            handler_table: InitStateLock::new([None; IRQNumber::MAX_INCLUSIVE + 1]),
        }
    }

    /// Disable every distributor line, clear all pending state and force all lines to the
    /// non-secure group.
    ///
    /// Hand-off step. Called with interrupts already masked at the core.
    pub fn quiesce(&self) {
        self.gicd.quiesce();
    }
}

//------------------------------------------------------------------------------
// OS Interface Code
//------------------------------------------------------------------------------

impl driver::interface::DeviceDriver for GICv2 {
    type IRQNumberType = IRQNumber;

    fn compatible(&self) -> &'static str {
        Self::COMPATIBLE
    }

    unsafe fn init(&self) -> Result<(), &'static str> {
        self.gicd.boot_core_init();
        self.gicc.priority_accept_all();
        self.gicc.enable();

        Ok(())
    }
}

impl exception::asynchronous::interface::IRQManager for GICv2 {
    type IRQNumberType = IRQNumber;

    fn register_handler(
        &self,
        irq_handler_descriptor: exception::asynchronous::IRQHandlerDescriptor<Self::IRQNumberType>,
    ) -> Result<(), &'static str> {
        self.handler_table.write(|table| {
            let irq_number = irq_handler_descriptor.number().get();

            if table[irq_number].is_some() {
                return Err("IRQ handler already registered");
            }

            table[irq_number] = Some(irq_handler_descriptor);

            Ok(())
        })
    }

    fn enable(&self, irq_number: &Self::IRQNumberType) {
        self.gicd.enable(irq_number);
    }

    fn handle_pending_irqs<'irq_context>(
        &'irq_context self,
        ic: &exception::asynchronous::IRQContext<'irq_context>,
    ) {
        // Extract the highest priority pending IRQ number from the Interrupt Acknowledge
        // Register (IAR).
        let irq_number = self.gicc.pending_irq_number(ic);

        // Guard against spurious interrupts.
        if irq_number > GICv2::MAX_IRQ_NUMBER {
            return;
        }

        // Call the IRQ handler. Panic if there is none.
        self.handler_table.read(|table| match table[irq_number] {
            None => panic!("No handler registered for IRQ {}", irq_number),
            Some(descriptor) => {
                // Call the IRQ handler. Panics on failure.
                descriptor.handler().handle().expect("Error handling IRQ");
            }
        });

        // Signal completion of handling.
        self.gicc.mark_completed(irq_number as u32, ic);
    }
}
