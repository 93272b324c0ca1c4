// SPDX-License-Identifier: MIT OR Apache-2.0

//! Architectural processor code.
//!
//! # Orientation
//!
//! Since arch modules are imported into generic modules using the path attribute, the path of this
//! file is:
//!
//! crate::cpu::arch_cpu

use aarch64_cpu::asm;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

pub use asm::nop;

/// Pause execution on the core.
#[inline(always)]
pub fn wait_forever() -> ! {
    loop {
        asm::wfe()
    }
}

/// Branch to a raw integer value.
///
/// This is the hand-off trampoline: it transfers control to a computed address without setting up
/// anything that would allow a return to the caller's stack frame.
///
/// # Safety
///
/// - The address must contain executable code for the current exception level.
#[inline(always)]
pub unsafe fn branch_to_raw_addr(addr: usize) -> ! {
    core::arch::asm!(
        "blr {destination}",
        destination = in(reg) addr,
        options(noreturn)
    )
}
