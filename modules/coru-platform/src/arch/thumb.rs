//! ARM thumb mode backend
//!
//! Written against the Thumb-1 subset so the same routine runs on ARMv6-M.
//! On hard-float targets (`coru_thumb_vfp`) s16-s31 are saved as well.

use super::coru_switch;
use crate::traits::{Arch, Entry};

/// Callee-saved registers as `coru_switch` leaves them on the stack
///
/// r8-r11 sit below r4-r7 because Thumb-1 can only push low registers.
/// The VFP block, when present, is pushed last and so sits lowest.
#[repr(C)]
pub struct Frame {
    #[cfg(coru_thumb_vfp)]
    pub s16_s31: [u32; 16],
    pub r8: usize,
    pub r9: usize,
    pub r10: usize,
    pub r11: usize,
    pub r4: usize,
    pub r5: usize,
    pub r6: usize,
    pub r7: usize,
    pub pc: usize,
}

pub struct ArchImpl;

// Popping can restore lr or r0 but not both along with pc, so the first
// activation lands here to move data and the halt routine into place.
core::arch::global_asm!(
    ".text",
    ".syntax unified",
    ".thumb_func",
    ".global coru_trampoline",
    ".type coru_trampoline, %function",
    "coru_trampoline:",
    "mov lr, r6", // ret to halt
    "mov r0, r5", // tail call cb(data)
    "bx r4",
    ".size coru_trampoline, . - coru_trampoline",
);

#[cfg(not(coru_thumb_vfp))]
core::arch::global_asm!(
    ".text",
    ".syntax unified",
    ".thumb_func",
    ".global coru_switch",
    ".type coru_switch, %function",
    "coru_switch:",
    // push callee saved registers
    "push {{r4, r5, r6, r7, lr}}",
    // thumb1 can only push r0-r7
    "mov r4, r8",
    "mov r5, r9",
    "mov r6, r10",
    "mov r7, r11",
    "push {{r4, r5, r6, r7}}",
    // swap stack, thumb1 can't load/store sp directly
    "mov r2, sp",
    "ldr r3, [r0]",
    "str r2, [r0]",
    "mov sp, r3",
    // return arg
    "mov r0, r1",
    // pop callee saved registers and return
    "pop {{r4, r5, r6, r7}}",
    "mov r8, r4",
    "mov r9, r5",
    "mov r10, r6",
    "mov r11, r7",
    "pop {{r4, r5, r6, r7, pc}}",
    ".size coru_switch, . - coru_switch",
);

#[cfg(coru_thumb_vfp)]
core::arch::global_asm!(
    ".text",
    ".syntax unified",
    ".thumb_func",
    ".global coru_switch",
    ".type coru_switch, %function",
    "coru_switch:",
    // push callee saved registers
    "push {{r4, r5, r6, r7, lr}}",
    "mov r4, r8",
    "mov r5, r9",
    "mov r6, r10",
    "mov r7, r11",
    "push {{r4, r5, r6, r7}}",
    "vpush {{s16-s31}}",
    // swap stack
    "mov r2, sp",
    "ldr r3, [r0]",
    "str r2, [r0]",
    "mov sp, r3",
    // return arg
    "mov r0, r1",
    // pop callee saved registers and return
    "vpop {{s16-s31}}",
    "pop {{r4, r5, r6, r7}}",
    "mov r8, r4",
    "mov r9, r5",
    "mov r10, r6",
    "mov r11, r7",
    "pop {{r4, r5, r6, r7, pc}}",
    ".size coru_switch, . - coru_switch",
);

unsafe extern "C" {
    fn coru_trampoline();
}

impl Arch for ArchImpl {
    type Frame = Frame;

    fn initial_frame(entry: &Entry) -> Frame {
        Frame {
            #[cfg(coru_thumb_vfp)]
            s16_s31: [0; 16],
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            r4: entry.callback_addr(),
            r5: entry.data_addr(),
            r6: entry.halt_addr(),
            r7: 0,
            // thumb bit is set by .thumb_func
            pc: coru_trampoline as *const () as usize,
        }
    }

    #[inline(always)]
    unsafe fn switch(slot: *mut *mut u8, arg: isize) -> isize {
        unsafe { coru_switch(slot, arg) }
    }
}
