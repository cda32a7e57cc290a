//! Backend selection
//!
//! Each backend module provides `ArchImpl`, its `#[repr(C)]` register frame and
//! the `global_asm!` switch routine exported as `coru_switch`.

// ===== BACKEND SELECTION =====

// x86 32-bits
#[cfg(target_arch = "x86")]
mod x86;
#[cfg(target_arch = "x86")]
pub use x86::*;

// x86 64-bits
#[cfg(target_arch = "x86_64")]
mod x86_64;
#[cfg(target_arch = "x86_64")]
pub use x86_64::*;

// ARM thumb mode, `coru_thumb` comes from the build script
#[cfg(all(target_arch = "arm", coru_thumb))]
mod thumb;
#[cfg(all(target_arch = "arm", coru_thumb))]
pub use thumb::*;

// MIPS o32, nightly only until `asm_experimental_arch` is stable
#[cfg(target_arch = "mips")]
mod mips;
#[cfg(target_arch = "mips")]
pub use mips::*;

// AArch64
#[cfg(target_arch = "aarch64")]
mod aarch64;
#[cfg(target_arch = "aarch64")]
pub use aarch64::*;

// RISC-V 64-bits
#[cfg(target_arch = "riscv64")]
mod riscv64;
#[cfg(target_arch = "riscv64")]
pub use riscv64::*;

#[cfg(not(any(
    target_arch = "x86",
    target_arch = "x86_64",
    all(target_arch = "arm", coru_thumb),
    target_arch = "mips",
    target_arch = "aarch64",
    target_arch = "riscv64",
)))]
compile_error!("Unknown platform! coru-platform has no context switch for this target");

unsafe extern "C" {
    /// Stack swap routine, defined in the selected backend's `global_asm!`.
    fn coru_switch(slot: *mut *mut u8, arg: isize) -> isize;
}
