// SPDX-License-Identifier: MIT OR Apache-2.0

//! BSP asynchronous exception handling.

use crate::bsp;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Export for reuse in generic asynchronous.rs.
pub use bsp::device_driver::IRQNumber;

/// The IRQ map of this board.
pub(in crate::bsp) mod irq_map {
    use super::IRQNumber;

    pub const PL011_UART: IRQNumber = IRQNumber::new(153);
}
