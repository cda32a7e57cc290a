//! MIPS o32 backend
//!
//! Soft-float ABI only, $f20-$f30 are not saved.

use super::coru_switch;
use crate::traits::{Arch, Entry};

/// Callee-saved registers as `coru_switch` leaves them on the stack
#[repr(C)]
pub struct Frame {
    pub s0: usize,
    pub s1: usize,
    pub s2: usize,
    pub s3: usize,
    pub s4: usize,
    pub s5: usize,
    pub s6: usize,
    pub s7: usize,
    pub fp: usize,
    pub ra: usize,
}

pub struct ArchImpl;

// Position independent o32 code expects its own address in $t9 on entry, and
// callers reserve a 16 byte argument area, so both the callback and the halt
// routine are called from here rather than returned into.
core::arch::global_asm!(
    ".text",
    ".globl coru_trampoline",
    ".type coru_trampoline, %function",
    "coru_trampoline:",
    "addiu $sp, $sp, -16",
    "move $a0, $s1", // cb(data)
    "move $t9, $s0",
    "jalr $t9",
    "move $t9, $s2", // halt, never returns
    "jalr $t9",
    ".size coru_trampoline, . - coru_trampoline",
);

core::arch::global_asm!(
    ".text",
    ".globl coru_switch",
    ".type coru_switch, %function",
    "coru_switch:",
    // push callee saved registers
    "addiu $sp, $sp, -40",
    "sw $s0,  0($sp)",
    "sw $s1,  4($sp)",
    "sw $s2,  8($sp)",
    "sw $s3, 12($sp)",
    "sw $s4, 16($sp)",
    "sw $s5, 20($sp)",
    "sw $s6, 24($sp)",
    "sw $s7, 28($sp)",
    "sw $fp, 32($sp)",
    "sw $ra, 36($sp)",
    // swap stack
    "lw $t0, 0($a0)",
    "sw $sp, 0($a0)",
    "move $sp, $t0",
    // pop callee saved registers
    "lw $s0,  0($sp)",
    "lw $s1,  4($sp)",
    "lw $s2,  8($sp)",
    "lw $s3, 12($sp)",
    "lw $s4, 16($sp)",
    "lw $s5, 20($sp)",
    "lw $s6, 24($sp)",
    "lw $s7, 28($sp)",
    "lw $fp, 32($sp)",
    "lw $ra, 36($sp)",
    "addiu $sp, $sp, 40",
    // return arg
    "move $v0, $a1",
    "jr $ra",
    ".size coru_switch, . - coru_switch",
);

unsafe extern "C" {
    fn coru_trampoline();
}

impl Arch for ArchImpl {
    type Frame = Frame;

    fn initial_frame(entry: &Entry) -> Frame {
        Frame {
            s0: entry.callback_addr(),
            s1: entry.data_addr(),
            s2: entry.halt_addr(),
            s3: 0,
            s4: 0,
            s5: 0,
            s6: 0,
            s7: 0,
            fp: 0,
            ra: coru_trampoline as *const () as usize,
        }
    }

    #[inline(always)]
    unsafe fn switch(slot: *mut *mut u8, arg: isize) -> isize {
        unsafe { coru_switch(slot, arg) }
    }
}
