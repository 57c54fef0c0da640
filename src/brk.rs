//! Program-break primitive: the only point where this crate asks the
//! operating system for more address space.
//!
//! Wraps `libc::sbrk` directly; it is treated elsewhere in this crate
//! as an opaque "extend the data segment, report the old break"
//! primitive. The break only ever grows — there is no shrink operation.

use libc::{c_void, intptr_t, sbrk};

/// Returns the current end of the process's data segment.
pub fn current_break() -> *mut u8 {
    unsafe { sbrk(0) as *mut u8 }
}

/// Extends the data segment by `n` bytes.
///
/// Returns the address the segment ended at just before growth (the
/// start of the newly obtained region), or `None` if the kernel refused
/// the request.
pub fn extend(n: usize) -> Option<*mut u8> {
    let old = unsafe { sbrk(n as intptr_t) };
    if old == usize::MAX as *mut c_void {
        None
    } else {
        Some(old as *mut u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serialize_sbrk;

    #[test]
    fn extend_moves_the_break_forward_by_the_requested_amount() {
        let _guard = serialize_sbrk();

        let before = current_break();
        let old = extend(64).expect("sbrk should succeed for a small request");
        let after = current_break();

        assert_eq!(old, before);
        assert_eq!(after as usize, before as usize + 64);
    }

    #[test]
    fn extend_by_zero_does_not_move_the_break() {
        let _guard = serialize_sbrk();

        let before = current_break();
        let old = extend(0).expect("sbrk(0) never fails");
        assert_eq!(old, before);
        assert_eq!(current_break(), before);
    }
}
