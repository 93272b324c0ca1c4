// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processor code.

#[cfg(target_arch = "aarch64")]
#[path = "_arch/aarch64/cpu.rs"]
mod arch_cpu;

pub mod boot;

//--------------------------------------------------------------------------------------------------
// Architectural Public Reexports
//--------------------------------------------------------------------------------------------------
#[cfg(target_arch = "aarch64")]
pub use arch_cpu::{branch_to_raw_addr, nop, wait_forever};

//--------------------------------------------------------------------------------------------------
// Host stand-ins
//--------------------------------------------------------------------------------------------------

/// Pause hint. Host stand-in for unit tests.
#[cfg(not(target_arch = "aarch64"))]
#[inline(always)]
pub fn nop() {
    core::hint::spin_loop()
}

/// Park forever. Host stand-in for unit tests.
#[cfg(not(target_arch = "aarch64"))]
pub fn wait_forever() -> ! {
    loop {
        core::hint::spin_loop()
    }
}

/// Host stand-in. The hand-off trampoline only exists on the target.
///
/// # Safety
///
/// - Never sane to call on the host; present only so that board code type-checks there.
#[cfg(not(target_arch = "aarch64"))]
pub unsafe fn branch_to_raw_addr(_addr: usize) -> ! {
    unimplemented!("hand-off is not available on the host")
}
