//! # rallocator - a region-growing `malloc` replacement
//!
//! This crate implements the C allocator ABI — `malloc`, `free`,
//! `calloc`, `realloc` — over a single heap grown with the program
//! break (`sbrk(2)`), never returned to the operating system.
//!
//! ## Overview
//!
//! ```text
//!   Heap Memory Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌─────┬─────┬─────┬─────┬───────────────────────────────────────┐  │
//!   │   │  A  │  B  │  C  │ ... │            unclaimed                  │  │
//!   │   └─────┴─────┴─────┴─────┴───────────────────────────────────────┘  │
//!   │     ▲                                                           ▲    │
//!   │     │                                                           │    │
//!   │    head                                                 Program     │
//!   │  (first block)                                            Break     │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Each block is a header followed by its payload. Blocks never move and
//!   are never returned to the OS; a freed block stays on the list to be
//!   reused, split, or coalesced with its neighbors.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rallocator
//!   ├── align   - 4-byte request rounding
//!   ├── block   - block header layout
//!   ├── brk     - program-break primitive
//!   ├── policy  - first/best/worst/next-fit placement search
//!   ├── heap    - growth, splitting, coalescing
//!   └── stats   - exit-time statistics and their report format
//! ```
//!
//! ## Placement policy
//!
//! Exactly one of the `policy-first-fit` / `policy-best-fit` /
//! `policy-worst-fit` / `policy-next-fit` Cargo features selects which
//! strategy is compiled in; see [`policy`]. `policy-first-fit` is the
//! default.
//!
//! ## Statistics
//!
//! A process linking this crate as its allocator prints a report of
//! block-management counters to stdout on exit, registered via
//! `libc::atexit` on the first call into the allocator. See [`stats`].
//!
//! ## Safety
//!
//! Every method here assumes a single mutator: this crate performs no
//! internal locking, matching the allocator it replaces. Concurrent
//! calls into the same heap are undefined behavior.

pub mod align;
pub mod block;
pub mod brk;
pub mod heap;
pub mod policy;
pub mod stats;

#[cfg(not(test))]
mod abi {
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::heap::Heap;
    use crate::stats::Stats;

    static mut HEAP: Heap = Heap::new();
    static mut STATS: Stats = Stats::new();
    static ATEXIT_REGISTERED: AtomicBool = AtomicBool::new(false);

    /// Registers [`report_statistics`] with `libc::atexit` exactly once,
    /// on the first call into the allocator.
    fn ensure_atexit_registered() {
        if ATEXIT_REGISTERED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            unsafe {
                libc::atexit(report_statistics);
            }
        }
    }

    extern "C" fn report_statistics() {
        unsafe { (*(&raw const STATS)).print() }
    }

    /// # Safety
    /// Must not run concurrently with any other call into this crate's
    /// allocator functions — see the crate-level docs.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
        ensure_atexit_registered();
        unsafe {
            match (*(&raw mut HEAP)).allocate(&mut *(&raw mut STATS), size) {
                Some(p) => p as *mut c_void,
                None => std::ptr::null_mut(),
            }
        }
    }

    /// # Safety
    /// `ptr` must be null or a pointer previously returned by
    /// [`malloc`], [`calloc`], or [`realloc`], not already freed.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn free(ptr: *mut c_void) {
        unsafe {
            (*(&raw mut HEAP)).release(&mut *(&raw mut STATS), ptr as *mut u8);
        }
    }

    /// # Safety
    /// See [`malloc`].
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn calloc(count: usize, size: usize) -> *mut c_void {
        ensure_atexit_registered();
        unsafe {
            match (*(&raw mut HEAP)).zero_allocate(&mut *(&raw mut STATS), count, size) {
                Some(p) => p as *mut c_void,
                None => std::ptr::null_mut(),
            }
        }
    }

    /// # Safety
    /// `ptr` must be null or a pointer previously returned by
    /// [`malloc`], [`calloc`], or [`realloc`], not already freed.
    #[unsafe(no_mangle)]
    pub unsafe extern "C" fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
        ensure_atexit_registered();
        unsafe {
            match (*(&raw mut HEAP)).reallocate(&mut *(&raw mut STATS), ptr as *mut u8, size) {
                Some(p) => p as *mut c_void,
                None => std::ptr::null_mut(),
            }
        }
    }
}

#[cfg(not(test))]
pub use abi::{calloc, free, malloc, realloc};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard};

    /// Real `sbrk` touches the one program break shared by the whole
    /// test process; serialize any test that grows the heap so
    /// cargo test's default concurrent execution can't interleave two
    /// `current_break()` / `extend()` pairs.
    static SBRK_LOCK: Mutex<()> = Mutex::new(());

    pub fn serialize_sbrk() -> MutexGuard<'static, ()> {
        match SBRK_LOCK.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
