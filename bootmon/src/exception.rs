// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronous and asynchronous exception handling.

#[cfg(target_arch = "aarch64")]
#[path = "_arch/aarch64/exception.rs"]
mod arch_exception;

pub mod asynchronous;

//--------------------------------------------------------------------------------------------------
// Architectural Public Reexports
//--------------------------------------------------------------------------------------------------
#[cfg(target_arch = "aarch64")]
pub use arch_exception::{current_privilege_level, handling_init};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Kernel privilege levels.
#[allow(missing_docs)]
#[derive(Eq, PartialEq)]
pub enum PrivilegeLevel {
    User,
    Kernel,
    Hypervisor,
    Unknown,
}

//--------------------------------------------------------------------------------------------------
// Host stand-ins
//--------------------------------------------------------------------------------------------------

/// Host stand-in. There are no vectors to install in a unit test binary.
#[cfg(not(target_arch = "aarch64"))]
pub fn handling_init() {}

/// Host stand-in.
#[cfg(not(target_arch = "aarch64"))]
pub fn current_privilege_level() -> (PrivilegeLevel, &'static str) {
    (PrivilegeLevel::Unknown, "Unknown")
}
