use std::env;

fn main() {
    // The linker script only applies to the board image. Host builds (unit tests) link normally.
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("aarch64") {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();

        println!(
            "cargo:rustc-link-arg-bins=-T{}/src/bsp/raspberrypi/link.ld",
            manifest_dir
        );
        println!("cargo:rerun-if-changed=src/bsp/raspberrypi/link.ld");
        println!("cargo:rerun-if-changed=src/_arch/aarch64/cpu/boot.s");
        println!("cargo:rerun-if-changed=src/_arch/aarch64/exception.s");
    }
}
