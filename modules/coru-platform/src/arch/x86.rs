//! x86 32-bits (cdecl) backend

use super::coru_switch;
use crate::traits::{Arch, Entry};

/// Callee-saved registers as `coru_switch` leaves them on the stack
///
/// The `ret` of the switch jumps straight into the callback, which then finds
/// `halt_stub` as its return address and `data` as its first stack argument.
/// `data` lands on a 16-byte boundary, as cdecl on i386 ELF expects at a call.
#[repr(C)]
pub struct Frame {
    pub edi: usize,
    pub esi: usize,
    pub ebx: usize,
    pub ebp: usize,
    pub ret: usize,
    pub halt_stub: usize,
    pub data: usize,
    pub _pad: [usize; 3],
}

pub struct ArchImpl;

// The callback returns here with ebx intact (callee saved) holding the halt
// routine, esp points at the spent argument slot.
core::arch::global_asm!(
    ".text",
    ".globl coru_x86_halt_stub",
    ".type coru_x86_halt_stub, %function",
    "coru_x86_halt_stub:",
    "and esp, -16",
    "call ebx",
    "ud2",
    ".size coru_x86_halt_stub, . - coru_x86_halt_stub",
);

core::arch::global_asm!(
    ".text",
    ".globl coru_switch",
    ".type coru_switch, %function",
    "coru_switch:",
    // save arg to eax, return this later
    "mov eax, [esp + 8]",
    // load slot address to edx
    "mov edx, [esp + 4]",
    // push callee saved registers
    "push ebp",
    "push ebx",
    "push esi",
    "push edi",
    // swap stack
    "xchg esp, [edx]",
    // pop callee saved registers
    "pop edi",
    "pop esi",
    "pop ebx",
    "pop ebp",
    "ret",
    ".size coru_switch, . - coru_switch",
);

unsafe extern "C" {
    fn coru_x86_halt_stub();
}

impl Arch for ArchImpl {
    type Frame = Frame;

    fn initial_frame(entry: &Entry) -> Frame {
        Frame {
            edi: 0,
            esi: 0,
            ebx: entry.halt_addr(),
            ebp: 0,
            ret: entry.callback_addr(),
            halt_stub: coru_x86_halt_stub as *const () as usize,
            data: entry.data_addr(),
            _pad: [0; 3],
        }
    }

    #[inline(always)]
    unsafe fn switch(slot: *mut *mut u8, arg: isize) -> isize {
        unsafe { coru_switch(slot, arg) }
    }
}
