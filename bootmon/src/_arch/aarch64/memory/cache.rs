// SPDX-License-Identifier: MIT OR Apache-2.0

//! Architectural cache maintenance.
//!
//! # Orientation
//!
//! Since arch modules are imported into generic modules using the path attribute, the path of this
//! file is:
//!
//! crate::memory::cache::arch_cache

use aarch64_cpu::{asm::barrier, registers::*};
use core::arch::asm;
use tock_registers::interfaces::ReadWriteable;

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

#[inline(always)]
fn read_clidr() -> u64 {
    let clidr: u64;
    unsafe {
        asm!("mrs {}, clidr_el1", out(reg) clidr, options(nomem, nostack, preserves_flags));
    }
    clidr
}

/// Select a cache level in CSSELR and read back its geometry from CCSIDR.
#[inline(always)]
fn read_ccsidr(csselr: u64) -> u64 {
    let ccsidr: u64;
    unsafe {
        asm!("msr csselr_el1, {}", in(reg) csselr, options(nomem, nostack, preserves_flags));
    }
    barrier::isb(barrier::SY);
    unsafe {
        asm!("mrs {}, ccsidr_el1", out(reg) ccsidr, options(nomem, nostack, preserves_flags));
    }
    ccsidr
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Clean every data/unified cache level by set/way, writing all dirty lines back to memory.
///
/// Walks CLIDR_EL1 from L1 upwards and issues `dc csw` for every set and way of each level that
/// implements a data or unified cache. Must run before translation and caching are switched off;
/// a loaded image must see its bytes in memory, not in a cache the image knows nothing about.
pub fn clean_data_cache_all() {
    let clidr = read_clidr();

    for level in 0..7u64 {
        let cache_type = (clidr >> (level * 3)) & 0b111;

        // 0b000 terminates the hierarchy. 0b001 is instruction-only; no data to clean there.
        if cache_type == 0 {
            break;
        }
        if cache_type < 0b010 {
            continue;
        }

        let csselr = level << 1;
        let ccsidr = read_ccsidr(csselr);

        let line_shift = (ccsidr & 0b111) + 4;
        let last_way = (ccsidr >> 3) & 0x3ff;
        let last_set = (ccsidr >> 13) & 0x7fff;
        let way_shift = (last_way as u32).leading_zeros() as u64;

        for set in 0..=last_set {
            for way in 0..=last_way {
                let set_way = (way << way_shift) | (set << line_shift) | csselr;
                unsafe {
                    asm!("dc csw, {}", in(reg) set_way, options(nostack, preserves_flags));
                }
            }
        }
    }

    barrier::dsb(barrier::SY);
}

/// Invalidate the entire instruction cache.
pub fn invalidate_instruction_cache_all() {
    unsafe {
        asm!("ic iallu", options(nomem, nostack, preserves_flags));
    }
    barrier::dsb(barrier::SY);
    barrier::isb(barrier::SY);
}

/// Switch data and instruction caching off.
///
/// # Safety
///
/// - The data cache must have been cleaned beforehand, otherwise dirty lines are lost.
pub unsafe fn disable() {
    SCTLR_EL1.modify(SCTLR_EL1::C::NonCacheable + SCTLR_EL1::I::NonCacheable);

    barrier::isb(barrier::SY);
}
