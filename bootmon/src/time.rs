// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timer primitives.

#[cfg(target_arch = "aarch64")]
#[path = "_arch/aarch64/time.rs"]
mod arch_time;

/// Host stand-in. Supplies a monotonically advancing fake uptime so that timestamped prints and
/// timeout arithmetic are exercisable in unit tests.
#[cfg(not(target_arch = "aarch64"))]
mod arch_time {
    use core::sync::atomic::{AtomicU64, Ordering};
    use core::time::Duration;

    static MONOTONIC_NANOS: AtomicU64 = AtomicU64::new(0);

    pub fn resolution() -> Duration {
        Duration::from_nanos(1)
    }

    pub fn uptime() -> Duration {
        // Every observation advances the clock, so deadline loops terminate.
        Duration::from_nanos(MONOTONIC_NANOS.fetch_add(1_000, Ordering::Relaxed))
    }

    pub fn spin_for(_duration: Duration) {}
}

use core::time::Duration;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Provides time management functions.
pub struct TimeManager;

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

static TIME_MANAGER: TimeManager = TimeManager;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Return a reference to the global TimeManager.
pub fn time_manager() -> &'static TimeManager {
    &TIME_MANAGER
}

impl TimeManager {
    /// The timer's resolution.
    pub fn resolution(&self) -> Duration {
        arch_time::resolution()
    }

    /// The uptime since power-on of the device.
    ///
    /// This includes time consumed by firmware and bootloaders.
    pub fn uptime(&self) -> Duration {
        arch_time::uptime()
    }

    /// Spin for a given duration.
    pub fn spin_for(&self, duration: Duration) {
        arch_time::spin_for(duration)
    }
}
