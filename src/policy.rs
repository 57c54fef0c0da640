//! Placement policy: which free block satisfies an allocation request.
//!
//! The four strategies share one search interface and differ only in
//! traversal order and tie-breaking. Which one is compiled in is a
//! build-time choice, made with Cargo features instead of the original
//! allocator's `#if defined FIT && FIT == 0`-style toggles — exactly
//! one of `policy-first-fit` / `policy-best-fit` / `policy-worst-fit` /
//! `policy-next-fit` must be enabled.

use crate::block::Block;

/// A placement strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    First,
    Best,
    Worst,
    Next,
}

impl Policy {
    /// The single-character label this policy reports in the exit-time
    /// statistics block.
    pub const fn label(self) -> char {
        match self {
            Policy::First => 'F',
            Policy::Best => 'B',
            Policy::Worst => 'W',
            Policy::Next => 'N',
        }
    }
}

#[cfg(not(any(
    feature = "policy-first-fit",
    feature = "policy-best-fit",
    feature = "policy-worst-fit",
    feature = "policy-next-fit"
)))]
compile_error!(
    "exactly one of the policy-first-fit / policy-best-fit / policy-worst-fit / \
     policy-next-fit features must be enabled"
);

#[cfg(any(
    all(feature = "policy-first-fit", feature = "policy-best-fit"),
    all(feature = "policy-first-fit", feature = "policy-worst-fit"),
    all(feature = "policy-first-fit", feature = "policy-next-fit"),
    all(feature = "policy-best-fit", feature = "policy-worst-fit"),
    all(feature = "policy-best-fit", feature = "policy-next-fit"),
    all(feature = "policy-worst-fit", feature = "policy-next-fit"),
))]
compile_error!("only one policy-* feature may be enabled at a time");

#[cfg(feature = "policy-first-fit")]
pub const ACTIVE_POLICY: Policy = Policy::First;
#[cfg(feature = "policy-best-fit")]
pub const ACTIVE_POLICY: Policy = Policy::Best;
#[cfg(feature = "policy-worst-fit")]
pub const ACTIVE_POLICY: Policy = Policy::Worst;
#[cfg(feature = "policy-next-fit")]
pub const ACTIVE_POLICY: Policy = Policy::Next;

/// The outcome of a placement search: the chosen block, if any, and the
/// tail encountered along the way. Callers use `last` to splice a newly
/// grown block onto the list when nothing qualifies; next-fit never
/// reports one (see [`find_next_fit`]), since growth after a failed
/// next-fit search rediscovers the tail some other way.
pub struct SearchResult {
    pub candidate: *mut Block,
    pub last: *mut Block,
}

/// Scans the block list for a free block of at least `size` bytes,
/// using [`ACTIVE_POLICY`]. `cursor` is the next-fit resumption point;
/// ignored by the other three policies.
///
/// # Safety
/// `head` and `cursor` must each be null or point into the same
/// well-formed, address-ordered block list.
pub unsafe fn find_free(head: *mut Block, cursor: *mut Block, size: usize) -> SearchResult {
    unsafe {
        match ACTIVE_POLICY {
            Policy::First => find_first_fit(head, size),
            Policy::Best => find_best_fit(head, size),
            Policy::Worst => find_worst_fit(head, size),
            Policy::Next => find_next_fit(head, cursor, size),
        }
    }
}

/// First qualifying block in forward address order.
///
/// # Safety
/// `head` must be null or point into a well-formed block list.
pub unsafe fn find_first_fit(head: *mut Block, size: usize) -> SearchResult {
    unsafe {
        let mut last = std::ptr::null_mut();
        let mut curr = head;
        while !curr.is_null() {
            if (*curr).free && (*curr).size >= size {
                return SearchResult { candidate: curr, last };
            }
            last = curr;
            curr = (*curr).next;
        }
        SearchResult {
            candidate: std::ptr::null_mut(),
            last,
        }
    }
}

/// Smallest qualifying block; ties keep the earliest-encountered one.
///
/// # Safety
/// `head` must be null or point into a well-formed block list.
pub unsafe fn find_best_fit(head: *mut Block, size: usize) -> SearchResult {
    unsafe {
        let mut best: *mut Block = std::ptr::null_mut();
        let mut last = std::ptr::null_mut();
        let mut curr = head;
        while !curr.is_null() {
            if (*curr).free && (*curr).size >= size
                && (best.is_null() || (*curr).size < (*best).size)
            {
                best = curr;
            }
            last = curr;
            curr = (*curr).next;
        }
        SearchResult {
            candidate: best,
            last,
        }
    }
}

/// Largest qualifying block; ties keep the earliest-encountered one.
///
/// # Safety
/// `head` must be null or point into a well-formed block list.
pub unsafe fn find_worst_fit(head: *mut Block, size: usize) -> SearchResult {
    unsafe {
        let mut worst: *mut Block = std::ptr::null_mut();
        let mut last = std::ptr::null_mut();
        let mut curr = head;
        while !curr.is_null() {
            if (*curr).free && (*curr).size >= size
                && (worst.is_null() || (*curr).size > (*worst).size)
            {
                worst = curr;
            }
            last = curr;
            curr = (*curr).next;
        }
        SearchResult {
            candidate: worst,
            last,
        }
    }
}

/// Circular scan starting at `cursor.next` (or `head` if `cursor` is
/// absent); stops once a qualifier is found or the start position is
/// revisited. Never reports a tail — growth after a failed next-fit
/// search must rediscover it through [`crate::heap::Heap`]'s own
/// tracked tail instead.
///
/// # Safety
/// `head` and `cursor` must each be null or point into the same
/// well-formed block list.
pub unsafe fn find_next_fit(head: *mut Block, cursor: *mut Block, size: usize) -> SearchResult {
    unsafe {
        if head.is_null() {
            return SearchResult {
                candidate: std::ptr::null_mut(),
                last: std::ptr::null_mut(),
            };
        }

        let start = if cursor.is_null() {
            head
        } else {
            let after = (*cursor).next;
            if after.is_null() { head } else { after }
        };

        let mut curr = start;
        loop {
            if (*curr).free && (*curr).size >= size {
                return SearchResult {
                    candidate: curr,
                    last: std::ptr::null_mut(),
                };
            }
            curr = if (*curr).next.is_null() {
                head
            } else {
                (*curr).next
            };
            if curr == start {
                break;
            }
        }

        SearchResult {
            candidate: std::ptr::null_mut(),
            last: std::ptr::null_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A small, owned, address-stable chain of free/used blocks for
    /// exercising the search functions without touching the real heap.
    struct Chain {
        nodes: Vec<*mut Block>,
    }

    impl Chain {
        fn new(sizes_and_free: &[(usize, bool)]) -> Self {
            let mut nodes = Vec::new();
            for &(size, free) in sizes_and_free {
                let boxed = Box::new(Block {
                    size,
                    next: std::ptr::null_mut(),
                    prev: std::ptr::null_mut(),
                    free,
                });
                nodes.push(Box::into_raw(boxed));
            }
            for i in 0..nodes.len() {
                unsafe {
                    (*nodes[i]).next = if i + 1 < nodes.len() {
                        nodes[i + 1]
                    } else {
                        std::ptr::null_mut()
                    };
                    (*nodes[i]).prev = if i == 0 {
                        std::ptr::null_mut()
                    } else {
                        nodes[i - 1]
                    };
                }
            }
            Self { nodes }
        }

        fn head(&self) -> *mut Block {
            self.nodes[0]
        }

        fn at(&self, i: usize) -> *mut Block {
            self.nodes[i]
        }
    }

    impl Drop for Chain {
        fn drop(&mut self) {
            for &node in &self.nodes {
                unsafe {
                    drop(Box::from_raw(node));
                }
            }
        }
    }

    #[test]
    fn first_fit_returns_the_first_qualifying_block() {
        let chain = Chain::new(&[(16, false), (16, true), (32, true)]);
        let result = unsafe { find_first_fit(chain.head(), 12) };
        assert_eq!(result.candidate, chain.at(1));
    }

    #[test]
    fn best_fit_breaks_ties_by_earliest_encountered() {
        // Two equally-qualifying 16-byte blocks: the earlier one in
        // list order wins over the later one.
        let chain = Chain::new(&[(16, true), (16, true), (32, true)]);
        let result = unsafe { find_best_fit(chain.head(), 12) };
        assert_eq!(result.candidate, chain.at(0));
    }

    #[test]
    fn worst_fit_returns_the_largest_qualifying_block() {
        // Of three qualifying blocks, the largest is chosen.
        let chain = Chain::new(&[(16, true), (32, true), (24, true)]);
        let result = unsafe { find_worst_fit(chain.head(), 12) };
        assert_eq!(result.candidate, chain.at(1));
    }

    #[test]
    fn next_fit_wraps_around_and_advances_the_cursor() {
        // Three equally-sized blocks A, B, C with the cursor at B: the
        // scan starts at C, wraps through A, and would reach B last;
        // C qualifies first, so it is returned and becomes the new
        // cursor.
        let chain = Chain::new(&[(16, true), (16, true), (16, true)]);
        let (a, b, c) = (chain.at(0), chain.at(1), chain.at(2));

        let result = unsafe { find_next_fit(a, b, 12) };
        assert_eq!(result.candidate, c);

        // A second request, cursor now at C, starts at A and returns it
        // immediately.
        let result2 = unsafe { find_next_fit(a, c, 12) };
        assert_eq!(result2.candidate, a);
    }

    #[test]
    fn next_fit_returns_nothing_after_a_full_circular_traversal() {
        let chain = Chain::new(&[(4, false), (4, false), (4, false)]);
        let result = unsafe { find_next_fit(chain.head(), std::ptr::null_mut(), 12) };
        assert!(result.candidate.is_null());
    }

    #[test]
    fn policy_labels_match_the_documented_characters() {
        assert_eq!(Policy::First.label(), 'F');
        assert_eq!(Policy::Best.label(), 'B');
        assert_eq!(Policy::Worst.label(), 'W');
        assert_eq!(Policy::Next.label(), 'N');
    }
}
