// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache maintenance.
//!
//! Only the teardown half of cache management lives here: the boot hand-off must leave memory
//! coherent for an image that starts with caches and translation in a state of its own choosing.

#[cfg(target_arch = "aarch64")]
#[path = "../_arch/aarch64/memory/cache.rs"]
mod arch_cache;

//--------------------------------------------------------------------------------------------------
// Architectural Public Reexports
//--------------------------------------------------------------------------------------------------
#[cfg(target_arch = "aarch64")]
pub use arch_cache::{clean_data_cache_all, disable, invalidate_instruction_cache_all};

//--------------------------------------------------------------------------------------------------
// Host stand-ins
//--------------------------------------------------------------------------------------------------

/// Host stand-in for unit tests.
#[cfg(not(target_arch = "aarch64"))]
pub fn clean_data_cache_all() {}

/// Host stand-in for unit tests.
#[cfg(not(target_arch = "aarch64"))]
pub fn invalidate_instruction_cache_all() {}

/// Host stand-in for unit tests.
///
/// # Safety
///
/// - None on the host; a no-op.
#[cfg(not(target_arch = "aarch64"))]
pub unsafe fn disable() {}
