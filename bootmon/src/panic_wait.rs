// SPDX-License-Identifier: MIT OR Apache-2.0

//! A panic handler that signals forever.
//!
//! Driver and hardware failures land here. There is no recovery: once a transfer has failed,
//! the DRAM contents can no longer be trusted, so the monitor reports what happened and keeps
//! reporting it - repeating LED pulses plus the message on the console - until power-cycle.

use crate::{bsp, cpu, exception, println};
use core::panic::PanicInfo;

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

/// Stop immediately if called a second time.
///
/// The first panic owns the console and the LED; a nested panic (e.g. from a failing print)
/// must not fight it.
fn panic_prevent_reenter() {
    use core::sync::atomic::{AtomicBool, Ordering};

    static PANIC_IN_PROGRESS: AtomicBool = AtomicBool::new(false);

    if !PANIC_IN_PROGRESS.load(Ordering::Relaxed) {
        PANIC_IN_PROGRESS.store(true, Ordering::Relaxed);

        return;
    }

    cpu::wait_forever()
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    // Protect against panic infinite loops if any of the following code panics itself.
    panic_prevent_reenter();

    // No interrupt may preempt the error reporting.
    exception::asynchronous::local_irq_mask();

    let timestamp = crate::time::time_manager().uptime();
    let (location, line, column) = match info.location() {
        Some(loc) => (loc.file(), loc.line(), loc.column()),
        _ => ("???", 0, 0),
    };

    println!(
        "[  {:>3}.{:06}] Monitor panic!\n\n\
        Panic location:\n      File '{}', line {}, column {}\n\n\
        {}",
        timestamp.as_secs(),
        timestamp.subsec_micros(),
        location,
        line,
        column,
        info.message(),
    );

    // Non-recoverable by design. Keep the failure visible.
    loop {
        bsp::driver::signal_error_pattern();
        println!("ERROR: {}", info.message());
    }
}
