use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Compile-time cap on node height, sized comfortably above any practical
/// configured height. Keeps the node layout a fixed-size array rather than
/// a hand-rolled variable-length allocation; only the first `height` slots
/// of any given node are ever read or written.
pub const MAX_HEIGHT_CAP: usize = 32;

/// A link to the next node at some level. `None` sorts after every key.
pub type Link<K> = *mut Node<K>;

/// Height-bounded array of atomic forward links, plus a key. The head
/// sentinel is a `Node` whose key is never initialized: no code path ever
/// reads a head node's key, only its links, so `key()` is only safe to call
/// on a node produced by `Node::new`.
/// `next[0]` is the bottom (densest) level. After the node is published into
/// the list, only its `next` slots are ever mutated again (invariant 4).
pub struct Node<K> {
    key: MaybeUninit<K>,
    height: usize,
    next: [AtomicPtr<Node<K>>; MAX_HEIGHT_CAP],
}

impl<K> Node<K> {
    pub(crate) fn new(key: K, height: usize) -> Self {
        debug_assert!(height >= 1 && height <= MAX_HEIGHT_CAP);
        Self {
            key: MaybeUninit::new(key),
            height,
            next: std::array::from_fn(|_| AtomicPtr::new(ptr::null_mut())),
        }
    }

    /// The head sentinel: a node with no initialized key. Only its `next`
    /// links are ever read.
    pub(crate) fn new_head(height: usize) -> Self {
        debug_assert!(height >= 1 && height <= MAX_HEIGHT_CAP);
        Self {
            key: MaybeUninit::uninit(),
            height,
            next: std::array::from_fn(|_| AtomicPtr::new(ptr::null_mut())),
        }
    }

    /// # Safety
    /// Must not be called on the head sentinel.
    #[inline]
    pub fn key(&self) -> &K {
        unsafe { self.key.assume_init_ref() }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Acquire load: observe a fully-initialized version of the linked node.
    #[inline]
    pub fn next(&self, level: usize) -> Link<K> {
        debug_assert!(level < self.height);
        self.next[level].load(Ordering::Acquire)
    }

    /// Release store: publish this node (and everything written before the
    /// call) to any reader that later acquire-loads the same slot.
    #[inline]
    pub fn set_next(&self, level: usize, link: Link<K>) {
        debug_assert!(level < self.height);
        self.next[level].store(link, Ordering::Release);
    }

    /// Relaxed load, safe only against a node the writer already owns
    /// exclusively (not yet linked into any level a reader can reach).
    #[inline]
    pub(crate) fn no_barrier_next(&self, level: usize) -> Link<K> {
        debug_assert!(level < self.height);
        self.next[level].load(Ordering::Relaxed)
    }

    /// Relaxed store, used only while initializing a not-yet-published node.
    #[inline]
    pub(crate) fn no_barrier_set_next(&self, level: usize, link: Link<K>) {
        debug_assert!(level < self.height);
        self.next[level].store(link, Ordering::Relaxed);
    }
}
