// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `bootmon` binary.
//!
//! A second-stage boot monitor: operator commands come in over the PL011 UART, images are pulled
//! from SD card into DRAM, and control is finally handed off to one of them for good.

#![cfg_attr(target_arch = "aarch64", no_main)]
#![cfg_attr(target_arch = "aarch64", no_std)]

#[cfg(target_arch = "aarch64")]
use core::time::Duration;
#[cfg(target_arch = "aarch64")]
use libbootmon::{bsp, console, driver, exception, info, shell, time};

/// Early init code.
///
/// # Safety
///
/// - Only a single core must be active and running this function.
/// - The init calls in this function must appear in the correct order:
///     - The exception vectors must be live before interrupts are unmasked.
///     - Devices must be initialized and registered with the interrupt controller before the
///       first receive interrupt can fire.
#[cfg(target_arch = "aarch64")]
#[no_mangle]
unsafe fn monitor_init() -> ! {
    exception::handling_init();

    if let Err(x) = bsp::driver::init() {
        panic!("Error initializing BSP driver subsystem: {}", x);
    }

    // Initialize all device drivers and let them register their IRQ handlers.
    driver::driver_manager().init_drivers_and_irqs();

    // Unmask interrupts on the boot core. The UART receive path is live from here on.
    exception::asynchronous::local_irq_unmask();

    // Transition from unsafe to safe.
    monitor_main()
}

/// The main function running after the early init.
#[cfg(target_arch = "aarch64")]
fn monitor_main() -> ! {
    info!("{}", libbootmon::version());
    info!("Booting on: {}", bsp::board_name());

    let (_, privilege_level) = exception::current_privilege_level();
    info!("Current privilege level: {}", privilege_level);

    info!("Drivers loaded:");
    driver::driver_manager().enumerate();

    let mut shell = shell::Shell::new(
        bsp::driver::rx_queue(),
        bsp::monitor::command_set(),
        console::console(),
    );
    shell.greet();

    let heartbeat_period = Duration::from_secs(1);
    let mut next_heartbeat = time::time_manager().uptime() + heartbeat_period;

    loop {
        shell.poll();

        let now = time::time_manager().uptime();
        if now >= next_heartbeat {
            next_heartbeat = now + heartbeat_period;
            bsp::driver::toggle_activity_led();
        }
    }
}

/// The monitor only runs on the target board. Host builds exist for the library's test suite.
#[cfg(not(target_arch = "aarch64"))]
fn main() {}
