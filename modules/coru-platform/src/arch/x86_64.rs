//! x86_64 System V backend

use super::coru_switch;
use crate::traits::{Arch, Entry};

/// Callee-saved registers as `coru_switch` leaves them on the stack
///
/// 7 words, popped from `rbx` upwards, the final `ret` consumes `ret`.
#[repr(C)]
pub struct Frame {
    pub rbx: usize,
    pub rbp: usize,
    pub r12: usize,
    pub r13: usize,
    pub r14: usize,
    pub r15: usize,
    pub ret: usize,
}

pub struct ArchImpl;

// A plain `ret` into the callback cannot set `rdi`, and entering the halt
// routine through the callback's own `ret` would break the 16-byte alignment
// rule, so fresh coroutines start in this stub. It is entered with
// rsp = aligned stack top, so both calls see the ABI alignment.
core::arch::global_asm!(
    ".text",
    ".globl coru_trampoline",
    ".type coru_trampoline, %function",
    "coru_trampoline:",
    "mov rdi, r13", // cb(data)
    "call r12",
    "call r14", // halt, never returns
    "ud2",
    ".size coru_trampoline, . - coru_trampoline",
);

core::arch::global_asm!(
    ".text",
    ".globl coru_switch",
    ".type coru_switch, %function",
    "coru_switch:",
    // push callee saved registers
    "push r15",
    "push r14",
    "push r13",
    "push r12",
    "push rbp",
    "push rbx",
    // swap stack
    "xchg rsp, [rdi]",
    // pop callee saved registers
    "pop rbx",
    "pop rbp",
    "pop r12",
    "pop r13",
    "pop r14",
    "pop r15",
    // return arg
    "mov rax, rsi",
    "ret",
    ".size coru_switch, . - coru_switch",
);

unsafe extern "C" {
    fn coru_trampoline();
}

impl Arch for ArchImpl {
    type Frame = Frame;

    fn initial_frame(entry: &Entry) -> Frame {
        Frame {
            rbx: 0,
            rbp: 0,
            r12: entry.callback_addr(),
            r13: entry.data_addr(),
            r14: entry.halt_addr(),
            r15: 0,
            ret: coru_trampoline as *const () as usize,
        }
    }

    #[inline(always)]
    unsafe fn switch(slot: *mut *mut u8, arg: isize) -> isize {
        unsafe { coru_switch(slot, arg) }
    }
}
