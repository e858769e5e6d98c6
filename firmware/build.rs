use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Only re-run the build script when memory.x is changed,
    // instead of when any part of the source code changes.
    println!("cargo:rerun-if-changed=memory.x");

    // Host builds (tests, clippy) need no linker script
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() != Ok("riscv32") {
        return;
    }

    // Put the linker script somewhere the linker can find it
    let out = match env::var_os("OUT_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => panic!("OUT_DIR not set"),
    };
    if let Err(e) = fs::copy("memory.x", out.join("memory.x")) {
        panic!("failed to copy memory.x: {e}");
    }
    println!("cargo:rustc-link-search={}", out.display());
}
