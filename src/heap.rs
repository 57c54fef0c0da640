//! The block manager: growth, splitting, and coalescing atop a
//! doubly-linked, address-ordered list of [`Block`]s.
//!
//! This is the core the rest of the crate exists to serve. Everything
//! here assumes a single mutator (see the crate docs) — concurrent
//! calls into the same `Heap` are undefined behavior, exactly like the
//! allocator this crate replaces.

use std::ptr;

use crate::align::align4;
use crate::block::{Block, HEADER_SIZE};
use crate::brk;
use crate::policy::{self, Policy, ACTIVE_POLICY};
use crate::stats::Stats;

/// Owns the heap's block list and the next-fit cursor.
///
/// The tail is tracked explicitly (`tail`) rather than rediscovered by
/// walking the list on every growth — the placement search only hands
/// back a usable tail when it actually visits the whole list (first/
/// best/worst-fit), and next-fit never does, so growth needs its own
/// source of truth for "where does the list currently end."
pub struct Heap {
    head: *mut Block,
    tail: *mut Block,
    /// Most recently selected block under next-fit; null before the
    /// first next-fit selection. Unused by the other three policies.
    next_fit_cursor: *mut Block,
}

impl Heap {
    pub const fn new() -> Self {
        Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
            next_fit_cursor: ptr::null_mut(),
        }
    }

    /// Allocates `n` bytes, returning the payload address.
    ///
    /// Returns `None` for a zero-size request or when the break
    /// primitive fails; neither case touches any counter beyond what
    /// has already happened.
    ///
    /// # Safety
    /// Must not run concurrently with any other `Heap` method on `self`.
    pub unsafe fn allocate(&mut self, stats: &mut Stats, n: usize) -> Option<*mut u8> {
        if n == 0 {
            return None;
        }
        let size = align4(n);
        stats.used = ACTIVE_POLICY.label();

        let chosen = unsafe {
            if self.head.is_null() {
                let block = self.grow(stats, size, None)?;
                self.head = block;
                // Documented double-count: the facade counts this
                // block a second time on top of `grow`'s own count.
                stats.blocks += 1;
                block
            } else {
                let result = policy::find_free(self.head, self.next_fit_cursor, size);
                if !result.candidate.is_null() {
                    stats.reuses += 1;
                    if matches!(ACTIVE_POLICY, Policy::Next) {
                        self.next_fit_cursor = result.candidate;
                    }
                    result.candidate
                } else {
                    let last = if matches!(ACTIVE_POLICY, Policy::Next) {
                        self.tail
                    } else {
                        result.last
                    };
                    self.grow(stats, size, Some(last))?
                }
            }
        };

        unsafe {
            self.split(stats, chosen, size);
            (*chosen).free = false;
        }
        stats.mallocs += 1;
        stats.requested += size;
        Some(unsafe { Block::payload(chosen) })
    }

    /// Releases a payload pointer previously returned by
    /// [`Heap::allocate`]. A null pointer is a no-op.
    ///
    /// # Safety
    /// `payload`, if non-null, must have been returned by this `Heap`
    /// and not already released — a double free is a fatal assertion
    /// here, not a recoverable error, matching the allocator this crate
    /// replaces.
    pub unsafe fn release(&mut self, stats: &mut Stats, payload: *mut u8) {
        if payload.is_null() {
            return;
        }
        unsafe {
            let block = Block::header_of(payload);
            assert!(!(*block).free, "double free of {payload:p}");
            (*block).free = true;
            stats.frees += 1;
            self.coalesce(stats, block);
        }
    }

    /// `allocate(count * size)`, zeroed. `count * size` is not checked
    /// for overflow, matching the allocator this crate replaces.
    ///
    /// # Safety
    /// See [`Heap::allocate`].
    pub unsafe fn zero_allocate(
        &mut self,
        stats: &mut Stats,
        count: usize,
        size: usize,
    ) -> Option<*mut u8> {
        let total = count.wrapping_mul(size);
        let payload = unsafe { self.allocate(stats, total)? };
        unsafe { ptr::write_bytes(payload, 0, total) };
        Some(payload)
    }

    /// Resizes a previous allocation. A null `payload` behaves as
    /// `allocate(n)`. Shrinking (`n <= payload(p)`) returns `payload`
    /// unchanged — no split is performed, so the tail space is wasted
    /// until the block is released.
    ///
    /// # Safety
    /// See [`Heap::allocate`] and [`Heap::release`].
    pub unsafe fn reallocate(
        &mut self,
        stats: &mut Stats,
        payload: *mut u8,
        n: usize,
    ) -> Option<*mut u8> {
        if payload.is_null() {
            return unsafe { self.allocate(stats, n) };
        }
        unsafe {
            let block = Block::header_of(payload);
            let current_size = (*block).size;
            if n <= current_size {
                return Some(payload);
            }
            let new_payload = self.allocate(stats, n)?;
            ptr::copy_nonoverlapping(payload, new_payload, current_size);
            self.release(stats, payload);
            Some(new_payload)
        }
    }

    /// Appends a new in-use block of `size` bytes at the current break,
    /// splicing it onto the list after `last` (or making it the sole
    /// head, when `last` is `None` and the list is still empty).
    unsafe fn grow(
        &mut self,
        stats: &mut Stats,
        size: usize,
        last: Option<*mut Block>,
    ) -> Option<*mut Block> {
        unsafe {
            let before = brk::current_break();
            let raw = brk::extend(HEADER_SIZE + size)?;
            assert_eq!(
                raw, before,
                "program break moved between current_break() and extend(): \
                 a concurrent mutator violated the single-mutator contract"
            );

            let block = raw as *mut Block;
            let predecessor = last.unwrap_or(self.tail);
            (*block).size = size;
            (*block).free = false;
            (*block).next = ptr::null_mut();
            (*block).prev = predecessor;

            if !predecessor.is_null() {
                (*predecessor).next = block;
            }
            self.tail = block;

            stats.grows += 1;
            stats.blocks += 1;
            stats.max_heap += HEADER_SIZE + size;

            Some(block)
        }
    }

    /// Carves a free tail fragment off `chosen` when the remainder
    /// after satisfying `size` is itself big enough to be its own
    /// block (`available >= size + HEADER_SIZE + 4`).
    unsafe fn split(&mut self, stats: &mut Stats, chosen: *mut Block, size: usize) {
        unsafe {
            let available = (*chosen).size;
            if available < size + HEADER_SIZE + 4 {
                return;
            }

            let tail_size = available - size - HEADER_SIZE;
            let tail_ptr = (Block::payload(chosen) as usize + size) as *mut Block;

            (*tail_ptr).size = tail_size;
            (*tail_ptr).free = true;
            (*tail_ptr).next = (*chosen).next;
            (*tail_ptr).prev = chosen;

            if !(*tail_ptr).next.is_null() {
                (*(*tail_ptr).next).prev = tail_ptr;
            } else {
                self.tail = tail_ptr;
            }

            (*chosen).size = size;
            (*chosen).next = tail_ptr;

            stats.splits += 1;
        }
    }

    /// Merges `freed` with any free neighbors: forward first, then
    /// backward, so a block sitting between two free neighbors ends up
    /// fully absorbed into one either way.
    unsafe fn coalesce(&mut self, stats: &mut Stats, freed: *mut Block) {
        unsafe {
            let next = (*freed).next;
            if !next.is_null() && (*next).free {
                (*freed).size += (*next).size + HEADER_SIZE;
                let next_next = (*next).next;
                (*freed).next = next_next;
                if !next_next.is_null() {
                    (*next_next).prev = freed;
                } else {
                    self.tail = freed;
                }
                if self.next_fit_cursor == next {
                    self.next_fit_cursor = freed;
                }
                stats.coalesces += 1;
            }

            let prev = (*freed).prev;
            if !prev.is_null() && (*prev).free {
                (*prev).size += (*freed).size + HEADER_SIZE;
                let freed_next = (*freed).next;
                (*prev).next = freed_next;
                if !freed_next.is_null() {
                    (*freed_next).prev = prev;
                } else {
                    self.tail = prev;
                }
                if self.next_fit_cursor == freed {
                    self.next_fit_cursor = prev;
                }
                stats.coalesces += 1;
            }
        }
    }
}
