use std::cell::{Cell, UnsafeCell};
use std::cmp::Ordering as CmpOrdering;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use log::trace;

use super::accel::redblack::RbTree;
use super::accel::tree::BstIndex;
use super::arena::Arena;
use super::comparator::Comparator;
use super::height::HeightSampler;
use super::node::{Link, Node, MAX_HEIGHT_CAP};
use super::rng::{RandomSource, ThreadRng};

pub const DEFAULT_MAX_HEIGHT: usize = 7;
pub const DEFAULT_BRANCHING: u32 = 4;

/// Return `true` if `key` sorts strictly after the node `n` points to.
/// A null link is considered to hold an infinite key, so it is never "after"
/// anything.
#[inline]
fn key_is_after_node<K, C: Comparator<K>>(cmp: &C, key: &K, n: Link<K>) -> bool {
    if n.is_null() {
        false
    } else {
        cmp.compare(unsafe { (*n).key() }, key) == CmpOrdering::Less
    }
}

/// An ordered, arena-backed skip list.
///
/// Single writer / many readers: every method takes `&self` so a reader can
/// hold a shared reference concurrently with the writer, but mutating
/// methods (`insert*`) still require the caller to hold an external write
/// lock — nothing here enforces that at the type level, so writer
/// exclusion is the caller's responsibility.
pub struct SkipList<K, C, R = ThreadRng> {
    head: Link<K>,
    max_height: AtomicUsize,
    branching: u32,
    comparator: C,
    arena: Arena,
    sampler: HeightSampler<R>,

    // Writer-exclusive scratch (invariants: only ever touched while the
    // caller's write lock is held).
    prev: UnsafeCell<[Link<K>; MAX_HEIGHT_CAP]>,
    prev_height: Cell<usize>,

    // Side-indexes, maintained only by the `*_accel` insert variants.
    tree_index: UnsafeCell<BstIndex<K>>,
    rb_index: UnsafeCell<RbTree<K>>,
}

// SAFETY: all mutation of the writer-exclusive fields (`prev`, `prev_height`,
// `arena`, `tree_index`, `rb_index`) is documented as requiring the caller's
// external write lock. The `next` links on published nodes are only ever
// touched through the acquire/release accessors on `Node`.
unsafe impl<K: Send, C: Send + Sync, R: Send + Sync> Send for SkipList<K, C, R> {}
unsafe impl<K: Send, C: Send + Sync, R: Send + Sync> Sync for SkipList<K, C, R> {}

impl<K: Clone, C: Comparator<K>, R: RandomSource> SkipList<K, C, R> {
    /// Construct a list with a custom random source, for deterministic
    /// tests. `max_height` must be in `[1, MAX_HEIGHT_CAP]` and `branching`
    /// must be greater than 1.
    pub fn with_rng(
        comparator: C,
        max_height: usize,
        branching: u32,
        rng: R,
    ) -> Result<Self, crate::error::IndexError> {
        if max_height == 0 || max_height > MAX_HEIGHT_CAP {
            return Err(crate::error::IndexError::InvalidArgument(format!(
                "max_height must be in [1, {MAX_HEIGHT_CAP}], got {max_height}"
            )));
        }
        if branching <= 1 {
            return Err(crate::error::IndexError::InvalidArgument(format!(
                "branching factor must be greater than 1, got {branching}"
            )));
        }

        let arena = Arena::new();
        let head: Link<K> = arena.alloc(Node::new_head(MAX_HEIGHT_CAP));

        Ok(Self {
            head,
            max_height: AtomicUsize::new(1),
            branching,
            comparator,
            arena,
            sampler: HeightSampler::new(max_height, branching, rng),
            prev: UnsafeCell::new([head; MAX_HEIGHT_CAP]),
            prev_height: Cell::new(1),
            tree_index: UnsafeCell::new(BstIndex::new()),
            rb_index: UnsafeCell::new(RbTree::new()),
        })
    }

    #[inline]
    fn get_max_height(&self) -> usize {
        self.max_height.load(AtomicOrdering::Relaxed)
    }

    #[inline]
    fn is_head(&self, n: Link<K>) -> bool {
        ptr::eq(n, self.head)
    }

    fn equal(&self, a: &K, b: &K) -> bool {
        self.comparator.compare(a, b) == CmpOrdering::Equal
    }

    // ---- C5: main list navigator -----------------------------------------

    /// First node with key >= `key`, or null if none.
    pub(crate) fn find_greater_or_equal(&self, key: &K) -> Link<K> {
        self.find_greater_or_equal_from(self.head, key)
    }

    fn find_greater_or_equal_from(&self, start: Link<K>, key: &K) -> Link<K> {
        let mut x = start;
        let mut level = self.get_max_height() - 1;
        let mut last_bigger: Link<K> = ptr::null_mut();
        loop {
            debug_assert!(!x.is_null());
            let next = unsafe { (*x).next(level) };
            let cmp = if next.is_null() || ptr::eq(next, last_bigger) {
                CmpOrdering::Greater
            } else {
                self.comparator.compare(unsafe { (*next).key() }, key)
            };
            match cmp {
                CmpOrdering::Equal => return next,
                CmpOrdering::Greater if level == 0 => return next,
                CmpOrdering::Less => x = next,
                _ => {
                    last_bigger = next;
                    level -= 1;
                }
            }
        }
    }

    /// Rightmost node strictly less than `key` (or `head` if none). If
    /// `prev_out` is supplied, fills it with the predecessor at every
    /// active level.
    pub(crate) fn find_less_than(&self, key: &K, prev_out: Option<&mut [Link<K>; MAX_HEIGHT_CAP]>) -> Link<K> {
        self.find_less_than_from(self.head, key, prev_out)
    }

    fn find_less_than_from(
        &self,
        start: Link<K>,
        key: &K,
        mut prev_out: Option<&mut [Link<K>; MAX_HEIGHT_CAP]>,
    ) -> Link<K> {
        let mut x = start;
        let mut level = self.get_max_height() - 1;
        let mut last_not_after: Link<K> = ptr::null_mut();
        loop {
            debug_assert!(!x.is_null());
            let next = unsafe { (*x).next(level) };
            if !ptr::eq(next, last_not_after) && key_is_after_node(&self.comparator, key, next) {
                x = next;
            } else {
                if let Some(ref mut p) = prev_out {
                    p[level] = x;
                }
                if level == 0 {
                    return x;
                }
                last_not_after = next;
                level -= 1;
            }
        }
    }

    /// Rightmost node in the whole list, or `head` if empty.
    pub(crate) fn find_last(&self) -> Link<K> {
        let mut x = self.head;
        let mut level = self.get_max_height() - 1;
        loop {
            let next = unsafe { (*x).next(level) };
            if next.is_null() {
                if level == 0 {
                    return x;
                }
                level -= 1;
            } else {
                x = next;
            }
        }
    }

    /// Rough rank estimate: not exact, extrapolated by the branching factor
    /// on every level drop.
    pub fn estimate_count_less_than(&self, key: &K) -> u64 {
        let mut count: u64 = 0;
        let mut x = self.head;
        let mut level = self.get_max_height() - 1;
        loop {
            let next = unsafe { (*x).next(level) };
            let next_is_geq = next.is_null()
                || self.comparator.compare(unsafe { (*next).key() }, key) != CmpOrdering::Less;
            if next_is_geq {
                if level == 0 {
                    return count;
                }
                count *= u64::from(self.branching);
                level -= 1;
            } else {
                x = next;
                count += 1;
            }
        }
    }

    /// Exact bottom-level node count by linear walk.
    pub fn estimate_max(&self) -> u64 {
        let mut count: u64 = 0;
        let mut x = self.head;
        loop {
            let next = unsafe { (*x).next(0) };
            if next.is_null() {
                return count;
            }
            count += 1;
            x = next;
        }
    }

    /// `true` iff an entry comparing equal to `key` is in the list.
    pub fn contains(&self, key: &K) -> bool {
        let x = self.find_greater_or_equal(key);
        !x.is_null() && self.equal(key, unsafe { (*x).key() })
    }

    /// Bytes the arena backing this list has handed out so far.
    pub fn arena_allocated_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }

    // ---- C6: inserter ------------------------------------------------------

    /// Primary insert. Requires the caller to hold the external write lock
    /// and that no key comparing equal to `key` is already present.
    pub fn insert(&self, key: K) {
        self.insert_with(key, InsertMode::Plain);
    }

    /// Insert `key`, additionally indexing it in the unbalanced BST
    /// accelerator (C9) when its drawn height equals the configured
    /// `MaxHeight`.
    pub fn insert_tree_accel(&self, key: K) {
        self.insert_with(key, InsertMode::TreeAccel);
    }

    /// Insert `key`, additionally indexing it in the red-black accelerator
    /// (C10) when its drawn height equals the configured `MaxHeight`.
    pub fn insert_rb_accel(&self, key: K) {
        self.insert_with(key, InsertMode::RbAccel);
    }

    fn insert_with(&self, key: K, mode: InsertMode) {
        let prev_height = self.prev_height.get();
        // SAFETY: writer-exclusive scratch; caller holds the external write lock.
        let prev = unsafe { &mut *self.prev.get() };

        let sequential_fast_path = !key_is_after_node(
            &self.comparator,
            &key,
            unsafe { (*prev[0]).no_barrier_next(0) },
        ) && (self.is_head(prev[0]) || key_is_after_node(&self.comparator, &key, prev[0]));

        if sequential_fast_path {
            // prev[1..prev_height] are still the correct predecessors: nothing
            // sorts between two consecutive level-0 nodes at any level, so if
            // `key` still falls in the same gap the previous insert left
            // behind, the whole cached splice is reusable as-is.
            debug_assert!(
                !self.is_head(prev[0]) || (prev_height == 1 && self.get_max_height() == 1)
            );
        } else {
            let found = match mode {
                InsertMode::TreeAccel => {
                    let start = unsafe { (*self.tree_index.get()).search(&self.comparator, &key, self.head) };
                    self.find_less_than_from(start, &key, Some(&mut *prev))
                }
                InsertMode::RbAccel => {
                    let start = unsafe { (*self.rb_index.get()).search(&self.comparator, &key, self.head) };
                    self.find_less_than_from(start, &key, Some(&mut *prev))
                }
                InsertMode::Plain => self.find_less_than_from(self.head, &key, Some(&mut *prev)),
            };
            prev[0] = found;
        }

        // Duplicate-insert is a caller precondition violation (§4.6, §4.12).
        let existing = unsafe { (*prev[0]).next(0) };
        assert!(
            existing.is_null() || !self.equal(&key, unsafe { (*existing).key() }),
            "duplicate key inserted into skip list"
        );

        let height = self.sampler.sample();
        let old_max_height = self.get_max_height();
        if height > old_max_height {
            for slot in prev.iter_mut().take(height).skip(old_max_height) {
                *slot = self.head;
            }
            trace!("raising skip list height from {old_max_height} to {height}");
            self.max_height.store(height, AtomicOrdering::Relaxed);
        }

        let x: Link<K> = self.arena.alloc(Node::new(key, height));
        for i in 0..height {
            unsafe {
                (*x).no_barrier_set_next(i, (*prev[i]).no_barrier_next(i));
                (*prev[i]).set_next(i, x);
            }
        }

        match mode {
            InsertMode::TreeAccel if height == self.sampler_max_height() => {
                let top = height - 1;
                let list_node = unsafe { (*prev[top]).next(top) };
                unsafe { (*self.tree_index.get()).insert(&self.comparator, list_node) };
            }
            InsertMode::RbAccel if height == self.sampler_max_height() => {
                let top = height - 1;
                let list_node = unsafe { (*prev[top]).next(top) };
                unsafe { (*self.rb_index.get()).insert(&self.comparator, list_node) };
            }
            _ => {}
        }

        for slot in prev.iter_mut().take(height) {
            *slot = x;
        }
        self.prev_height.set(height);
    }

    fn sampler_max_height(&self) -> usize {
        self.sampler.max_height()
    }

    // ---- accelerated lookups -------------------------------------------

    /// Equivalent to `contains`, but the descent starts from the unbalanced
    /// BST's closest express stop instead of `head`. A degenerate tree
    /// shape (adversarial insertion order) narrows the gain to a full
    /// descent in the worst case, but the entry point it returns is never
    /// past the target, so the result is always correct.
    pub fn contains_tree_accel(&self, key: &K) -> bool {
        let start = unsafe { (*self.tree_index.get()).search(&self.comparator, key, self.head) };
        if !self.is_head(start) && self.equal(key, unsafe { (*start).key() }) {
            return true;
        }
        let x = self.find_greater_or_equal_from(start, key);
        !x.is_null() && self.equal(key, unsafe { (*x).key() })
    }

    /// Equivalent to `contains`, but the descent starts from the red-black
    /// tree's closest express stop instead of `head` (C10).
    pub fn contains_rb_accel(&self, key: &K) -> bool {
        let start = unsafe { (*self.rb_index.get()).search(&self.comparator, key, self.head) };
        if !self.is_head(start) && self.equal(key, unsafe { (*start).key() }) {
            return true;
        }
        let x = self.find_greater_or_equal_from(start, key);
        !x.is_null() && self.equal(key, unsafe { (*x).key() })
    }

    /// Verify the red-black accelerator's invariants: black root, no
    /// red-red parent/child, equal black-height on every root-to-sentinel
    /// path. Intended for tests.
    pub fn check_rb_invariants(&self) -> bool {
        unsafe { (*self.rb_index.get()).check_invariants() }
    }

    pub(crate) fn head(&self) -> Link<K> {
        self.head
    }

    pub(crate) fn comparator(&self) -> &C {
        &self.comparator
    }
}

#[derive(Clone, Copy)]
enum InsertMode {
    Plain,
    TreeAccel,
    RbAccel,
}

impl<K: Clone, C: Comparator<K>> SkipList<K, C, ThreadRng> {
    /// Construct with the default thread-local RNG.
    pub fn new(comparator: C) -> Result<Self, crate::error::IndexError> {
        Self::with_rng(comparator, DEFAULT_MAX_HEIGHT, DEFAULT_BRANCHING, ThreadRng)
    }

    /// Construct with the default thread-local RNG and explicit parameters.
    pub fn with_params(
        comparator: C,
        max_height: usize,
        branching: u32,
    ) -> Result<Self, crate::error::IndexError> {
        Self::with_rng(comparator, max_height, branching, ThreadRng)
    }
}

// ---- C7: iterator ----------------------------------------------------------

/// Forward/backward positional cursor atop a [`SkipList`]. Iterators are
/// independent and cheap to create; they are not safe to share across
/// threads without external synchronization, but may run on a reader thread
/// concurrently with writer insertion — such an iterator may observe
/// insertions that occurred after it was constructed.
pub struct ListIterator<'a, K, C, R> {
    list: &'a SkipList<K, C, R>,
    node: Link<K>,
}

impl<'a, K: Clone, C: Comparator<K>, R: RandomSource> ListIterator<'a, K, C, R> {
    pub fn new(list: &'a SkipList<K, C, R>) -> Self {
        Self {
            list,
            node: ptr::null_mut(),
        }
    }

    pub fn valid(&self) -> bool {
        !self.node.is_null()
    }

    /// # Panics
    /// Panics if the iterator is not `valid()`.
    pub fn key(&self) -> &K {
        assert!(self.valid(), "key() called on invalid iterator");
        unsafe { (*self.node).key() }
    }

    /// # Panics
    /// Panics if the iterator is not `valid()`.
    pub fn next(&mut self) {
        assert!(self.valid(), "next() called on invalid iterator");
        self.node = unsafe { (*self.node).next(0) };
    }

    /// # Panics
    /// Panics if the iterator is not `valid()`.
    pub fn prev(&mut self) {
        assert!(self.valid(), "prev() called on invalid iterator");
        let key = unsafe { (*self.node).key().clone() };
        let candidate = self.list.find_less_than(&key, None);
        self.node = if self.list.is_head(candidate) {
            ptr::null_mut()
        } else {
            candidate
        };
    }

    pub fn seek(&mut self, target: &K) {
        self.node = self.list.find_greater_or_equal(target);
    }

    pub fn seek_for_prev(&mut self, target: &K) {
        self.seek(target);
        if !self.valid() {
            self.seek_to_last();
        }
        while self.valid() && self.list.comparator.compare(target, self.key()) == CmpOrdering::Less {
            self.prev();
        }
    }

    pub fn seek_to_first(&mut self) {
        self.node = unsafe { (*self.list.head()).next(0) };
    }

    pub fn seek_to_last(&mut self) {
        let last = self.list.find_last();
        self.node = if self.list.is_head(last) {
            ptr::null_mut()
        } else {
            last
        };
    }
}

impl<K, C, R> SkipList<K, C, R> {
    pub fn iterator(&self) -> ListIterator<'_, K, C, R>
    where
        K: Clone,
        C: Comparator<K>,
        R: RandomSource,
    {
        ListIterator::new(self)
    }
}

#[path = "skiplist_test.rs"]
#[cfg(test)]
mod skiplist_test;
