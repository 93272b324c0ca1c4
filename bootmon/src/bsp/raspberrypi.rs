// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level BSP file for the Raspberry Pi 4.

pub mod cpu;
pub mod driver;
pub mod exception;
pub mod memory;
pub mod monitor;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Board identification.
pub fn board_name() -> &'static str {
    "Raspberry Pi 4"
}
