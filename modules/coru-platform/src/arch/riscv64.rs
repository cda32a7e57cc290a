//! RISC-V 64-bits backend
//!
//! fs0-fs11 are saved when the `d` extension is enabled for the target.

use super::coru_switch;
use crate::traits::{Arch, Entry};

/// Callee-saved registers as `coru_switch` leaves them on the stack
///
/// Padded to keep sp 16-byte aligned.
#[cfg(not(target_feature = "d"))]
#[repr(C)]
pub struct Frame {
    pub ra: usize,
    pub s0_s11: [usize; 12],
    pub _pad: usize,
}

/// Callee-saved registers as `coru_switch` leaves them on the stack
///
/// Padded to keep sp 16-byte aligned.
#[cfg(target_feature = "d")]
#[repr(C)]
pub struct Frame {
    pub ra: usize,
    pub s0_s11: [usize; 12],
    pub fs0_fs11: [u64; 12],
    pub _pad: usize,
}

pub struct ArchImpl;

// Restoring can set ra but not a0, so fresh coroutines start here.
core::arch::global_asm!(
    ".text",
    ".globl coru_trampoline",
    ".type coru_trampoline, %function",
    "coru_trampoline:",
    "mv a0, s2", // cb(data)
    "mv ra, s3", // ret to halt
    "jr s1",
    ".size coru_trampoline, . - coru_trampoline",
);

#[cfg(not(target_feature = "d"))]
core::arch::global_asm!(
    ".text",
    ".globl coru_switch",
    ".type coru_switch, %function",
    "coru_switch:",
    // push callee saved registers
    "addi sp, sp, -112",
    "sd ra, 0(sp)",
    "sd s0, 8(sp)",
    "sd s1, 16(sp)",
    "sd s2, 24(sp)",
    "sd s3, 32(sp)",
    "sd s4, 40(sp)",
    "sd s5, 48(sp)",
    "sd s6, 56(sp)",
    "sd s7, 64(sp)",
    "sd s8, 72(sp)",
    "sd s9, 80(sp)",
    "sd s10, 88(sp)",
    "sd s11, 96(sp)",
    // swap stack
    "ld t0, 0(a0)",
    "sd sp, 0(a0)",
    "mv sp, t0",
    // pop callee saved registers
    "ld ra, 0(sp)",
    "ld s0, 8(sp)",
    "ld s1, 16(sp)",
    "ld s2, 24(sp)",
    "ld s3, 32(sp)",
    "ld s4, 40(sp)",
    "ld s5, 48(sp)",
    "ld s6, 56(sp)",
    "ld s7, 64(sp)",
    "ld s8, 72(sp)",
    "ld s9, 80(sp)",
    "ld s10, 88(sp)",
    "ld s11, 96(sp)",
    "addi sp, sp, 112",
    // return arg
    "mv a0, a1",
    "ret",
    ".size coru_switch, . - coru_switch",
);

#[cfg(target_feature = "d")]
core::arch::global_asm!(
    ".text",
    ".globl coru_switch",
    ".type coru_switch, %function",
    "coru_switch:",
    // push callee saved registers
    "addi sp, sp, -208",
    "sd ra, 0(sp)",
    "sd s0, 8(sp)",
    "sd s1, 16(sp)",
    "sd s2, 24(sp)",
    "sd s3, 32(sp)",
    "sd s4, 40(sp)",
    "sd s5, 48(sp)",
    "sd s6, 56(sp)",
    "sd s7, 64(sp)",
    "sd s8, 72(sp)",
    "sd s9, 80(sp)",
    "sd s10, 88(sp)",
    "sd s11, 96(sp)",
    "fsd fs0, 104(sp)",
    "fsd fs1, 112(sp)",
    "fsd fs2, 120(sp)",
    "fsd fs3, 128(sp)",
    "fsd fs4, 136(sp)",
    "fsd fs5, 144(sp)",
    "fsd fs6, 152(sp)",
    "fsd fs7, 160(sp)",
    "fsd fs8, 168(sp)",
    "fsd fs9, 176(sp)",
    "fsd fs10, 184(sp)",
    "fsd fs11, 192(sp)",
    // swap stack
    "ld t0, 0(a0)",
    "sd sp, 0(a0)",
    "mv sp, t0",
    // pop callee saved registers
    "ld ra, 0(sp)",
    "ld s0, 8(sp)",
    "ld s1, 16(sp)",
    "ld s2, 24(sp)",
    "ld s3, 32(sp)",
    "ld s4, 40(sp)",
    "ld s5, 48(sp)",
    "ld s6, 56(sp)",
    "ld s7, 64(sp)",
    "ld s8, 72(sp)",
    "ld s9, 80(sp)",
    "ld s10, 88(sp)",
    "ld s11, 96(sp)",
    "fld fs0, 104(sp)",
    "fld fs1, 112(sp)",
    "fld fs2, 120(sp)",
    "fld fs3, 128(sp)",
    "fld fs4, 136(sp)",
    "fld fs5, 144(sp)",
    "fld fs6, 152(sp)",
    "fld fs7, 160(sp)",
    "fld fs8, 168(sp)",
    "fld fs9, 176(sp)",
    "fld fs10, 184(sp)",
    "fld fs11, 192(sp)",
    "addi sp, sp, 208",
    // return arg
    "mv a0, a1",
    "ret",
    ".size coru_switch, . - coru_switch",
);

unsafe extern "C" {
    fn coru_trampoline();
}

impl Arch for ArchImpl {
    type Frame = Frame;

    fn initial_frame(entry: &Entry) -> Frame {
        let mut s0_s11 = [0; 12];
        s0_s11[1] = entry.callback_addr();
        s0_s11[2] = entry.data_addr();
        s0_s11[3] = entry.halt_addr();
        Frame {
            ra: coru_trampoline as *const () as usize,
            s0_s11,
            #[cfg(target_feature = "d")]
            fs0_fs11: [0; 12],
            _pad: 0,
        }
    }

    #[inline(always)]
    unsafe fn switch(slot: *mut *mut u8, arg: isize) -> isize {
        unsafe { coru_switch(slot, arg) }
    }
}
