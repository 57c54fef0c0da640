//! Block header: fixed-size metadata embedded at the base of every
//! heap region, immediately followed by its payload.

use std::mem;

/// Per-region metadata threaded into a doubly-linked, address-ordered
/// list. The links are raw addresses embedded in the blocks they
/// describe — there is no separate index, because once a payload
/// address is handed to a caller it can never move.
#[repr(C)]
pub struct Block {
    /// Payload byte count. Excludes this header.
    pub size: usize,
    /// Next block in address order, or null for the tail.
    pub next: *mut Block,
    /// Previous block in address order, or null for the head.
    pub prev: *mut Block,
    /// Available for reuse.
    pub free: bool,
}

/// Byte size of a [`Block`] header, trailing padding included.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

impl Block {
    /// The payload address for the block at `header`.
    ///
    /// # Safety
    /// `header` must point to a live `Block`.
    pub unsafe fn payload(header: *mut Block) -> *mut u8 {
        unsafe { (header as *mut u8).add(HEADER_SIZE) }
    }

    /// Recovers a block header from a payload pointer previously
    /// returned by [`Block::payload`].
    ///
    /// # Safety
    /// `payload` must have been returned by this allocator.
    pub unsafe fn header_of(payload: *mut u8) -> *mut Block {
        unsafe { payload.sub(HEADER_SIZE) as *mut Block }
    }
}
