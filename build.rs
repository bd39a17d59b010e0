use std::env;

fn main() {
    // Only the firmware binary needs the esp-hal linker script; host builds link normally.
    let target = env::var("TARGET").unwrap_or_default();
    if target.starts_with("riscv32imc") {
        println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
    }
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SSID");
    println!("cargo:rerun-if-env-changed=PASSWORD");
}
