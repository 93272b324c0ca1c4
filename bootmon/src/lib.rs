// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `bootmon` library.
//!
//! Used to compose the final monitor binary, and to host the unit tests of the interactive core.
//!
//! # Code organization and architecture
//!
//! The code is divided into different *modules*, each representing a typical **subsystem** of the
//! monitor. Top-level module files of subsystems reside directly in the `src` folder. For example,
//! `src/shell.rs` contains code that is concerned with all things command line.
//!
//! ## Visibility of processor architecture code
//!
//! Some subsystems depend on low-level code that is specific to the target processor architecture.
//! For each supported processor architecture, there exists a subfolder in `src/_arch`, for
//! example, `src/_arch/aarch64`.
//!
//! The architecture folders mirror the subsystem modules laid out in `src`. For example,
//! architectural code that belongs to the monitor's MMU subsystem (`src/memory/mmu.rs`) goes into
//! `src/_arch/aarch64/memory/mmu.rs`. The latter file is loaded as a module in
//! `src/memory/mmu.rs` using the `path attribute`. Usually, the chosen module name is the generic
//! module's name prefixed with `arch_`.
//!
//! On any architecture other than AArch64 (that is, on the host running the test suite), the
//! `arch_` modules are replaced by inert stand-ins, so that the interactive core - byte queue,
//! line editor, history, dispatcher, load path, hand-off sequencing - is testable with plain
//! `cargo test`.
//!
//! ## BSP code
//!
//! `BSP` stands for Board Support Package. `BSP` code is organized under `src/bsp.rs` and contains
//! target board specific definitions and functions. These are things such as the board's memory
//! map, instances of drivers for devices that are featured on the respective board, and the
//! board's operator command table.
//!
//! ## Monitor interfaces
//!
//! In order to provide a clean abstraction between `arch`, `bsp` and generic monitor code,
//! `interface` traits are provided *whenever possible* and *where it makes sense*. They are
//! defined in the respective subsystem module and help to enforce the idiom of *program to an
//! interface, not an implementation*. For example, the block-storage driver is only ever reached
//! through `loader::interface::BlockDevice`, which is also what the test suite's fake storage
//! devices implement.
//!
//! # Boot flow
//!
//! 1. The monitor's entry point is the function `cpu::boot::arch_boot::_start()`.
//!     - It is implemented in `src/_arch/aarch64/cpu/boot.s`.
//! 2. Once finished with architectural setup, the arch code calls `monitor_init()`.

#![no_std]

// The host test harness links `std`; the library itself stays `no_std`.
#[cfg(test)]
extern crate std;

#[cfg(all(target_arch = "aarch64", not(test)))]
mod panic_wait;
mod synchronization;

pub mod bsp;
pub mod console;
pub mod cpu;
pub mod driver;
pub mod exception;
pub mod handoff;
pub mod loader;
pub mod memory;
pub mod print;
pub mod shell;
pub mod time;

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// Version string.
pub fn version() -> &'static str {
    concat!(
        env!("CARGO_PKG_NAME"),
        " version ",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(all(target_arch = "aarch64", not(test)))]
extern "Rust" {
    fn monitor_init() -> !;
}
