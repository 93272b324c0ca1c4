// SPDX-License-Identifier: MIT OR Apache-2.0

//! BCM driver top level.

mod bcm2xxx_gpio;
mod bcm2xxx_pl011_uart;
mod bcm2xxx_pm;
mod bcm2xxx_sdhost;

pub use bcm2xxx_gpio::*;
pub use bcm2xxx_pl011_uart::*;
pub use bcm2xxx_pm::*;
pub use bcm2xxx_sdhost::*;
