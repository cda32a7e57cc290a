//! AArch64 (AAPCS64) backend

use super::coru_switch;
use crate::traits::{Arch, Entry};

/// Callee-saved registers as `coru_switch` leaves them on the stack
///
/// 20 words keep sp 16-byte aligned. Only the low 64 bits of v8-v15 are
/// callee saved, hence `d8`-`d15`.
#[repr(C)]
pub struct Frame {
    pub x19_x28: [usize; 10],
    pub x29: usize,
    pub x30: usize,
    pub d8_d15: [u64; 8],
}

pub struct ArchImpl;

// Restoring can set lr but not x0, so fresh coroutines start here.
core::arch::global_asm!(
    ".text",
    ".globl coru_trampoline",
    ".type coru_trampoline, %function",
    "coru_trampoline:",
    "mov x0, x20",  // cb(data)
    "mov x30, x21", // ret to halt
    "br x19",
    ".size coru_trampoline, . - coru_trampoline",
);

core::arch::global_asm!(
    ".text",
    ".globl coru_switch",
    ".type coru_switch, %function",
    "coru_switch:",
    // push callee saved registers
    "sub sp, sp, #160",
    "stp x19, x20, [sp, #0]",
    "stp x21, x22, [sp, #16]",
    "stp x23, x24, [sp, #32]",
    "stp x25, x26, [sp, #48]",
    "stp x27, x28, [sp, #64]",
    "stp x29, x30, [sp, #80]",
    "stp d8, d9, [sp, #96]",
    "stp d10, d11, [sp, #112]",
    "stp d12, d13, [sp, #128]",
    "stp d14, d15, [sp, #144]",
    // swap stack
    "mov x2, sp",
    "ldr x3, [x0]",
    "str x2, [x0]",
    "mov sp, x3",
    // pop callee saved registers
    "ldp x19, x20, [sp, #0]",
    "ldp x21, x22, [sp, #16]",
    "ldp x23, x24, [sp, #32]",
    "ldp x25, x26, [sp, #48]",
    "ldp x27, x28, [sp, #64]",
    "ldp x29, x30, [sp, #80]",
    "ldp d8, d9, [sp, #96]",
    "ldp d10, d11, [sp, #112]",
    "ldp d12, d13, [sp, #128]",
    "ldp d14, d15, [sp, #144]",
    "add sp, sp, #160",
    // return arg
    "mov x0, x1",
    "ret",
    ".size coru_switch, . - coru_switch",
);

unsafe extern "C" {
    fn coru_trampoline();
}

impl Arch for ArchImpl {
    type Frame = Frame;

    fn initial_frame(entry: &Entry) -> Frame {
        let mut x19_x28 = [0; 10];
        x19_x28[0] = entry.callback_addr();
        x19_x28[1] = entry.data_addr();
        x19_x28[2] = entry.halt_addr();
        Frame {
            x19_x28,
            x29: 0,
            x30: coru_trampoline as *const () as usize,
            d8_d15: [0; 8],
        }
    }

    #[inline(always)]
    unsafe fn switch(slot: *mut *mut u8, arg: isize) -> isize {
        unsafe { coru_switch(slot, arg) }
    }
}
