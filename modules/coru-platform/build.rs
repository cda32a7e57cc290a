use std::env;

#[path = "src/target.rs"]
mod target;

use target::{select, Target, CFGS};

fn main() {
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rerun-if-changed=src/target.rs");
    for cfg in CFGS {
        println!("cargo::rustc-check-cfg=cfg({})", cfg);
    }

    let triple = env::var("TARGET").unwrap_or_default();
    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let vendor = env::var("CARGO_CFG_TARGET_VENDOR").unwrap_or_default();

    let target = Target {
        triple: &triple,
        arch: &arch,
        os: &os,
        vendor: &vendor,
    };
    match select(&target) {
        Ok(backend) => {
            for cfg in backend.cfgs() {
                println!("cargo::rustc-cfg={}", cfg);
            }
        }
        Err(why) => panic!("coru-platform: {}, got `{}`", why, triple),
    }
}
