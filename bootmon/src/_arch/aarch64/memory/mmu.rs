// SPDX-License-Identifier: MIT OR Apache-2.0

//! Architectural Memory Management Unit teardown.
//!
//! # Orientation
//!
//! Since arch modules are imported into generic modules using the path attribute, the path of this
//! file is:
//!
//! crate::memory::mmu::arch_mmu

use aarch64_cpu::{asm::barrier, registers::*};
use core::arch::asm;
use tock_registers::interfaces::{ReadWriteable, Readable};

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Returns whether stage 1 translation is enabled for EL1.
#[inline(always)]
pub fn is_enabled() -> bool {
    SCTLR_EL1.matches_all(SCTLR_EL1::M::Enable)
}

/// Invalidate all EL1 translation lookaside entries.
pub fn invalidate_tlb() {
    // Ensure all prior table walks and memory accesses drained before the invalidate, and that
    // the invalidate completed before anything after it.
    barrier::dsb(barrier::SY);
    unsafe {
        asm!("tlbi vmalle1", options(nomem, nostack, preserves_flags));
    }
    barrier::dsb(barrier::SY);
    barrier::isb(barrier::SY);
}

/// Switch stage 1 address translation off.
///
/// # Safety
///
/// - After this, every address is a physical address. The caller must not rely on any virtual
///   mapping anymore, which in practice means identity-mapped code and stack.
pub unsafe fn disable() {
    SCTLR_EL1.modify(SCTLR_EL1::M::Disable);

    // Force completion before the next instruction fetch.
    barrier::isb(barrier::SY);
}
