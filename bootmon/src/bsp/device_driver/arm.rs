// SPDX-License-Identifier: MIT OR Apache-2.0

//! ARM driver top level.

mod gicv2;

pub use gicv2::*;
