// SPDX-License-Identifier: MIT OR Apache-2.0

//! BSP driver support.

use super::{exception, memory::map::mmio};
use crate::{
    bsp::device_driver,
    console, driver as generic_driver,
    exception as generic_exception,
    shell::queue::ByteQueue,
    time,
};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

/// Receive bytes land here; the shell's polling loop drains it.
static RX_QUEUE: ByteQueue = ByteQueue::new();

static PL011_UART: device_driver::PL011Uart =
    unsafe { device_driver::PL011Uart::new(mmio::PL011_UART_START, &RX_QUEUE) };
static GPIO: device_driver::GPIO = unsafe { device_driver::GPIO::new(mmio::GPIO_START) };

pub(super) static INTERRUPT_CONTROLLER: device_driver::GICv2 =
    unsafe { device_driver::GICv2::new(mmio::GICD_START, mmio::GICC_START) };
pub(super) static SD_HOST: device_driver::SDHost =
    unsafe { device_driver::SDHost::new(mmio::SDHOST_START) };
pub(super) static PM: device_driver::PM = unsafe { device_driver::PM::new(mmio::PM_START) };

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

/// This must be called only after successful init of the UART driver.
fn post_init_uart() -> Result<(), &'static str> {
    console::register_console(&PL011_UART);

    Ok(())
}

/// This must be called only after successful init of the GPIO driver.
fn post_init_gpio() -> Result<(), &'static str> {
    GPIO.map_pl011_uart();
    GPIO.map_sdhost();
    GPIO.init_activity_led();

    Ok(())
}

/// This must be called only after successful init of the interrupt controller driver.
fn post_init_interrupt_controller() -> Result<(), &'static str> {
    generic_exception::asynchronous::register_irq_manager(&INTERRUPT_CONTROLLER);

    Ok(())
}

fn driver_uart() -> Result<(), &'static str> {
    let uart_descriptor = generic_driver::DeviceDriverDescriptor::new(
        &PL011_UART,
        Some(post_init_uart),
        Some(exception::asynchronous::irq_map::PL011_UART),
    );
    generic_driver::driver_manager().register_driver(uart_descriptor);

    Ok(())
}

fn driver_gpio() -> Result<(), &'static str> {
    let gpio_descriptor =
        generic_driver::DeviceDriverDescriptor::new(&GPIO, Some(post_init_gpio), None);
    generic_driver::driver_manager().register_driver(gpio_descriptor);

    Ok(())
}

fn driver_interrupt_controller() -> Result<(), &'static str> {
    let interrupt_controller_descriptor = generic_driver::DeviceDriverDescriptor::new(
        &INTERRUPT_CONTROLLER,
        Some(post_init_interrupt_controller),
        None,
    );
    generic_driver::driver_manager().register_driver(interrupt_controller_descriptor);

    Ok(())
}

fn driver_sd_host() -> Result<(), &'static str> {
    let sd_host_descriptor = generic_driver::DeviceDriverDescriptor::new(&SD_HOST, None, None);
    generic_driver::driver_manager().register_driver(sd_host_descriptor);

    Ok(())
}

fn driver_pm() -> Result<(), &'static str> {
    let pm_descriptor = generic_driver::DeviceDriverDescriptor::new(&PM, None, None);
    generic_driver::driver_manager().register_driver(pm_descriptor);

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Initialize the driver subsystem.
///
/// # Safety
///
/// See child function calls.
pub unsafe fn init() -> Result<(), &'static str> {
    static INIT_DONE: AtomicBool = AtomicBool::new(false);
    if INIT_DONE.load(Ordering::Relaxed) {
        return Err("Init already done");
    }

    // Pin-muxing happens in the GPIO post-init callback, so register GPIO before the devices
    // whose pins it routes.
    driver_uart()?;
    driver_gpio()?;
    driver_interrupt_controller()?;
    driver_sd_host()?;
    driver_pm()?;

    INIT_DONE.store(true, Ordering::Relaxed);
    Ok(())
}

/// The receive queue the UART feeds.
pub fn rx_queue() -> &'static ByteQueue {
    &RX_QUEUE
}

/// Flip the activity LED.
pub fn toggle_activity_led() {
    GPIO.toggle_activity_led();
}

/// The board's visible fatal-error signature: two short and two long LED pulses.
///
/// One call is one iteration; the panic handler repeats it forever.
pub fn signal_error_pattern() {
    const SHORT: Duration = Duration::from_millis(25);
    const LONG: Duration = Duration::from_millis(100);

    for pulse in [SHORT, SHORT, LONG, LONG] {
        GPIO.toggle_activity_led();
        time::time_manager().spin_for(pulse);
        GPIO.toggle_activity_led();
        time::time_manager().spin_for(pulse);
    }
}
