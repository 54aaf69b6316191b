use std::cell::{Cell, UnsafeCell};
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering as AtomicOrdering};

use crate::error::IndexError;
use crate::index::arena::Arena;
use crate::index::height::HeightSampler;
use crate::index::node::MAX_HEIGHT_CAP;
use crate::index::rng::{RandomSource, ThreadRng};

/// Keys sharing a quotient are bucketed into one list node, compacting
/// `BUCKET_MOD` keys into a single allocation at the cost of relaxing
/// invariant 4 (a published node's `buf` slots are written after the node
/// is reachable by readers). Callers needing lock-free reads under
/// concurrent insert should use the plain [`super::super::skiplist::SkipList`]
/// instead; this variant is for single-writer/single-reader or externally
/// synchronized use only.
pub const BUCKET_MOD: u64 = 16;

type BucketLink = *mut BucketNode;

struct BucketNode {
    quotient: u64,
    height: usize,
    next: [AtomicPtr<BucketNode>; MAX_HEIGHT_CAP],
    buf: [Cell<bool>; BUCKET_MOD as usize],
}

impl BucketNode {
    fn new(quotient: u64, height: usize) -> Self {
        Self {
            quotient,
            height,
            next: std::array::from_fn(|_| AtomicPtr::new(ptr::null_mut())),
            buf: std::array::from_fn(|_| Cell::new(false)),
        }
    }

    #[inline]
    fn next(&self, level: usize) -> BucketLink {
        self.next[level].load(AtomicOrdering::Acquire)
    }

    #[inline]
    fn set_next(&self, level: usize, link: BucketLink) {
        self.next[level].store(link, AtomicOrdering::Release);
    }
}

/// Quotient/remainder-compacted skip list over `u64` keys (C8).
pub struct BucketedSkipList<R = ThreadRng> {
    head: BucketLink,
    max_height: AtomicUsize,
    arena: Arena,
    sampler: HeightSampler<R>,
    prev: UnsafeCell<[BucketLink; MAX_HEIGHT_CAP]>,
}

unsafe impl<R: Send + Sync> Send for BucketedSkipList<R> {}
unsafe impl<R: Send + Sync> Sync for BucketedSkipList<R> {}

impl<R: RandomSource> BucketedSkipList<R> {
    pub fn with_rng(max_height: usize, branching: u32, rng: R) -> Result<Self, IndexError> {
        if max_height == 0 || max_height > MAX_HEIGHT_CAP {
            return Err(IndexError::InvalidArgument(format!(
                "max_height must be in [1, {MAX_HEIGHT_CAP}], got {max_height}"
            )));
        }
        if branching <= 1 {
            return Err(IndexError::InvalidArgument(format!(
                "branching factor must be greater than 1, got {branching}"
            )));
        }
        let arena = Arena::new();
        let head: BucketLink = arena.alloc(BucketNode::new(0, MAX_HEIGHT_CAP));
        Ok(Self {
            head,
            max_height: AtomicUsize::new(1),
            arena,
            sampler: HeightSampler::new(max_height, branching, rng),
            prev: UnsafeCell::new([head; MAX_HEIGHT_CAP]),
        })
    }

    fn get_max_height(&self) -> usize {
        self.max_height.load(AtomicOrdering::Relaxed)
    }

    fn find_node(&self, quotient: u64, mut prev_out: Option<&mut [BucketLink; MAX_HEIGHT_CAP]>) -> BucketLink {
        let mut x = self.head;
        let mut level = self.get_max_height() - 1;
        loop {
            let next = unsafe { (*x).next(level) };
            let is_after = !next.is_null() && unsafe { (*next).quotient } < quotient;
            if is_after {
                x = next;
            } else {
                if let Some(ref mut p) = prev_out {
                    p[level] = x;
                }
                if level == 0 {
                    return x;
                }
                level -= 1;
            }
        }
    }

    /// Set `key`'s bit in its bucket, creating the bucket node if absent.
    /// Caller must hold the external write lock.
    pub fn insert_bucketed(&self, key: u64) {
        let quotient = key / BUCKET_MOD;
        let remainder = (key % BUCKET_MOD) as usize;
        let prev = unsafe { &mut *self.prev.get() };
        let pred = self.find_node(quotient, Some(prev));
        let existing = unsafe { (*pred).next(0) };
        if !existing.is_null() && unsafe { (*existing).quotient } == quotient {
            unsafe { (*existing).buf[remainder].set(true) };
            return;
        }

        let height = self.sampler.sample();
        let old_max_height = self.get_max_height();
        if height > old_max_height {
            for slot in prev.iter_mut().take(height).skip(old_max_height) {
                *slot = self.head;
            }
            self.max_height.store(height, AtomicOrdering::Relaxed);
        }

        let node = BucketNode::new(quotient, height);
        node.buf[remainder].set(true);
        let x: BucketLink = self.arena.alloc(node);
        for i in 0..height {
            unsafe {
                (*x).next[i].store((*prev[i]).next(i), AtomicOrdering::Relaxed);
                (*prev[i]).set_next(i, x);
            }
        }
    }

    /// `true` iff `key`'s bit is set in its bucket.
    pub fn contains_bucketed(&self, key: u64) -> bool {
        let quotient = key / BUCKET_MOD;
        let remainder = (key % BUCKET_MOD) as usize;
        let pred = self.find_node(quotient, None);
        let candidate = unsafe { (*pred).next(0) };
        if candidate.is_null() || unsafe { (*candidate).quotient } != quotient {
            return false;
        }
        unsafe { (*candidate).buf[remainder].get() }
    }
}

impl BucketedSkipList<ThreadRng> {
    pub fn new(max_height: usize, branching: u32) -> Result<Self, IndexError> {
        Self::with_rng(max_height, branching, ThreadRng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::rng::SeededRng;

    #[test]
    fn shares_nodes_within_a_bucket() {
        let list = BucketedSkipList::with_rng(7, 4, SeededRng::new(1)).unwrap();
        for key in 0..BUCKET_MOD {
            list.insert_bucketed(key);
        }
        for key in 0..BUCKET_MOD {
            assert!(list.contains_bucketed(key));
        }
        assert!(!list.contains_bucketed(BUCKET_MOD));
        // one bucket node should serve the whole [0, BUCKET_MOD) range
        let pred = list.find_node(0, None);
        let node = unsafe { (*pred).next(0) };
        assert!(!node.is_null());
        assert_eq!(unsafe { (*node).quotient }, 0);
        assert!(unsafe { (*node).next(0) }.is_null());
    }

    #[test]
    fn distinguishes_across_bucket_boundaries() {
        let list = BucketedSkipList::with_rng(7, 4, SeededRng::new(2)).unwrap();
        list.insert_bucketed(3);
        list.insert_bucketed(BUCKET_MOD + 3);
        assert!(list.contains_bucketed(3));
        assert!(list.contains_bucketed(BUCKET_MOD + 3));
        assert!(!list.contains_bucketed(4));
        assert!(!list.contains_bucketed(BUCKET_MOD + 4));
    }
}
