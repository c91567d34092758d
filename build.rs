//! Build script for tiermem
//!
//! Declares the custom cfg names used by the crate and turns cargo features
//! plus the target description into them. Runtime CPU detection happens in
//! `system::cpu_features`; nothing here probes the build host.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rustc-check-cfg=cfg(tiermem_x86_64)");
    println!("cargo:rustc-check-cfg=cfg(tiermem_avx512)");

    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    match target_arch.as_str() {
        "x86_64" => configure_x86_64(),
        other => {
            println!(
                "cargo:warning=tiermem: no vector engine for target architecture '{}', using the portable scalar engine",
                other
            );
        }
    }
}

/// x86_64 gets the SSE2 system engine unconditionally; AVX-512 is opt-out.
fn configure_x86_64() {
    println!("cargo:rustc-cfg=tiermem_x86_64");

    if env::var_os("CARGO_FEATURE_AVX512").is_some() {
        println!("cargo:rustc-cfg=tiermem_avx512");
    }
}
