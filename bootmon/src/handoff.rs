// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boot hand-off.
//!
//! The one-way transfer of the CPU to a loaded image. The teardown order is load-bearing:
//!
//! 1. Mask IRQs and FIQs - no asynchronous re-entry from here on.
//! 2. Invalidate the TLB - no stale translations survive into the next step.
//! 3. Disable address translation - all addresses are physical now.
//! 4. Clean the data cache - every written byte of the image is in memory, not in a cache line.
//! 5. Invalidate the instruction cache - no stale monitor code can be fetched.
//! 6. Disable the caches.
//! 7. Quiesce the interrupt controller - no enables, no pendings, all lines non-secure.
//! 8. Jump through the trampoline.
//!
//! Steps 2-6 must precede step 8 because the image at the target address starts with its own
//! memory map; steps 1 and 7 must precede it because an interrupt taken after the vectors are
//! gone lands in the weeds. Once step 8 runs, the monitor's state no longer exists; there is no
//! error path and no retry.

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Hand-off interfaces.
pub mod interface {

    /// The hardware operations the hand-off sequence is built from.
    ///
    /// The BSP supplies the real implementation; tests supply a recording fake to pin the call
    /// order.
    pub trait Platform {
        /// Mask all maskable and fast interrupt sources at the core.
        fn mask_interrupts(&self);

        /// Invalidate the translation lookaside structures.
        fn invalidate_tlb(&self);

        /// Switch address translation off.
        fn disable_translation(&self);

        /// Write all dirty data-cache lines back to memory.
        fn clean_data_cache(&self);

        /// Invalidate the instruction cache.
        fn invalidate_instruction_cache(&self);

        /// Switch data and instruction caches off.
        fn disable_caches(&self);

        /// Clear enables and pendings in the interrupt-controller distributor and force all
        /// lines to the non-secure group.
        fn quiesce_interrupt_controller(&self);

        /// Transfer control to `target`.
        ///
        /// # Safety
        ///
        /// - `target` must contain code that is executable in the machine state the preceding
        ///   teardown steps established.
        unsafe fn jump(&self, target: usize) -> !;
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Pick the hand-off target address.
///
/// The operator's candidate wins only if it was the sole argument and lies at or above the
/// minimum valid load address. Everything else falls back to the configured default entry point.
pub fn resolve_target(arg_count: usize, candidate: u64, minimum: usize, default: usize) -> usize {
    if arg_count == 1 && candidate >= minimum as u64 {
        candidate as usize
    } else {
        default
    }
}

/// Tear the machine down in strict order, then jump. Never returns.
///
/// # Safety
///
/// - See [`interface::Platform::jump`]. Additionally, once this function is entered there is no
///   way back into the monitor; the caller must have finished everything it ever wanted to do.
pub unsafe fn execute(platform: &dyn interface::Platform, target: usize) -> ! {
    platform.mask_interrupts();
    platform.invalidate_tlb();
    platform.disable_translation();
    platform.clean_data_cache();
    platform.invalidate_instruction_cache();
    platform.disable_caches();
    platform.quiesce_interrupt_controller();

    platform.jump(target)
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, vec::Vec};

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Step {
        MaskInterrupts,
        InvalidateTlb,
        DisableTranslation,
        CleanDataCache,
        InvalidateInstructionCache,
        DisableCaches,
        QuiesceInterruptController,
    }

    /// Records the teardown steps; `jump` verifies the full order before bailing out via panic,
    /// which is the only way a `-> !` fake can end.
    struct RecordingPlatform {
        steps: RefCell<Vec<Step>>,
    }

    impl interface::Platform for RecordingPlatform {
        fn mask_interrupts(&self) {
            self.steps.borrow_mut().push(Step::MaskInterrupts);
        }
        fn invalidate_tlb(&self) {
            self.steps.borrow_mut().push(Step::InvalidateTlb);
        }
        fn disable_translation(&self) {
            self.steps.borrow_mut().push(Step::DisableTranslation);
        }
        fn clean_data_cache(&self) {
            self.steps.borrow_mut().push(Step::CleanDataCache);
        }
        fn invalidate_instruction_cache(&self) {
            self.steps.borrow_mut().push(Step::InvalidateInstructionCache);
        }
        fn disable_caches(&self) {
            self.steps.borrow_mut().push(Step::DisableCaches);
        }
        fn quiesce_interrupt_controller(&self) {
            self.steps.borrow_mut().push(Step::QuiesceInterruptController);
        }

        unsafe fn jump(&self, target: usize) -> ! {
            assert_eq!(
                *self.steps.borrow(),
                [
                    Step::MaskInterrupts,
                    Step::InvalidateTlb,
                    Step::DisableTranslation,
                    Step::CleanDataCache,
                    Step::InvalidateInstructionCache,
                    Step::DisableCaches,
                    Step::QuiesceInterruptController,
                ]
            );
            panic!("jumped to {:#x}", target);
        }
    }

    #[test]
    #[should_panic(expected = "jumped to 0x200000")]
    fn teardown_runs_in_strict_order_then_jumps() {
        let platform = RecordingPlatform {
            steps: RefCell::new(Vec::new()),
        };

        // An out-of-order sequence would panic with an assertion message instead, failing the
        // expected-message check.
        unsafe { execute(&platform, 0x20_0000) }
    }

    #[test]
    fn candidate_wins_with_exactly_one_argument_at_or_above_minimum() {
        assert_eq!(resolve_target(1, 0x20_0000, 0x10_0000, 0xdead), 0x20_0000);
        assert_eq!(resolve_target(1, 0x10_0000, 0x10_0000, 0xdead), 0x10_0000);
    }

    #[test]
    fn below_minimum_candidate_falls_back_to_default() {
        assert_eq!(resolve_target(1, 0xf_ffff, 0x10_0000, 0x20_0000), 0x20_0000);
    }

    #[test]
    fn wrong_argument_count_falls_back_to_default() {
        assert_eq!(resolve_target(0, 0, 0x10_0000, 0x20_0000), 0x20_0000);
        assert_eq!(
            resolve_target(2, 0x30_0000, 0x10_0000, 0x20_0000),
            0x20_0000
        );
    }
}
