//! Exercises the C-ABI allocator functions directly, the way a C caller
//! would link against `librallocator.so` and call `malloc`/`free`.
//!
//! Run with a specific policy, e.g.:
//!
//! ```sh
//! cargo run --example demo --no-default-features --features policy-best-fit
//! ```

use std::ffi::c_void;

unsafe extern "C" {
    fn malloc(size: usize) -> *mut c_void;
    fn free(ptr: *mut c_void);
    fn calloc(count: usize, size: usize) -> *mut c_void;
    fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void;
}

fn main() {
    unsafe {
        let a = malloc(8) as *mut u8;
        assert!(!a.is_null());
        *a = 42;

        let b = calloc(4, 4) as *mut u8;
        assert!(!b.is_null());
        for i in 0..16 {
            assert_eq!(*b.add(i), 0);
        }

        free(a as *mut c_void);

        let c = malloc(4) as *mut u8;
        println!("reused block A for C: {}", c == a);

        let grown = realloc(c as *mut c_void, 64) as *mut u8;
        assert!(!grown.is_null());

        free(grown as *mut c_void);
        free(b as *mut c_void);
    }
}
