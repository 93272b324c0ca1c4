// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device driver.

mod arm;
mod bcm;
mod common;

pub use arm::*;
pub use bcm::*;
