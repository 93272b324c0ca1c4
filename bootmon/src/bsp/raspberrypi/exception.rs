// SPDX-License-Identifier: MIT OR Apache-2.0

//! BSP exception handling.

pub mod asynchronous;
