use std::cmp::Ordering;

use crate::index::comparator::Comparator;
use crate::index::node::Link;

/// Unbalanced BST accelerator (C9): indexes every list node whose drawn
/// height equals the configured `MaxHeight`, so a lookup can start its list
/// descent from the BST's closest floor entry instead of `head`. With no
/// rebalancing this degrades to a linked list under adversarial insertion
/// order; a degenerate tree still returns a correct (if less helpful) entry
/// point, so lookups are never wrong, only slower.
pub struct BstIndex<K> {
    root: Option<Box<BstNode<K>>>,
}

struct BstNode<K> {
    key: K,
    list_node: Link<K>,
    left: Option<Box<BstNode<K>>>,
    right: Option<Box<BstNode<K>>>,
}

impl<K: Clone> BstIndex<K> {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Closest indexed node with key <= `key`, or `head` if the tree is
    /// empty or every indexed key is greater.
    pub fn search<C: Comparator<K>>(&self, cmp: &C, key: &K, head: Link<K>) -> Link<K> {
        let mut cursor = self.root.as_deref();
        let mut best = head;
        while let Some(n) = cursor {
            match cmp.compare(&n.key, key) {
                Ordering::Equal => return n.list_node,
                Ordering::Less => {
                    best = n.list_node;
                    cursor = n.right.as_deref();
                }
                Ordering::Greater => cursor = n.left.as_deref(),
            }
        }
        best
    }

    pub fn insert<C: Comparator<K>>(&mut self, cmp: &C, list_node: Link<K>) {
        let key = unsafe { (*list_node).key().clone() };
        Self::insert_rec(&mut self.root, cmp, key, list_node);
    }

    fn insert_rec<C: Comparator<K>>(
        slot: &mut Option<Box<BstNode<K>>>,
        cmp: &C,
        key: K,
        list_node: Link<K>,
    ) {
        match slot {
            None => {
                *slot = Some(Box::new(BstNode {
                    key,
                    list_node,
                    left: None,
                    right: None,
                }));
            }
            Some(n) => match cmp.compare(&key, &n.key) {
                Ordering::Less | Ordering::Equal => Self::insert_rec(&mut n.left, cmp, key, list_node),
                Ordering::Greater => Self::insert_rec(&mut n.right, cmp, key, list_node),
            },
        }
    }
}

impl<K: Clone> Default for BstIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::comparator::NaturalOrder;
    use crate::index::node::Node;

    fn leak_node(key: i32) -> Link<i32> {
        Box::into_raw(Box::new(Node::new(key, 1)))
    }

    #[test]
    fn search_on_empty_tree_returns_head() {
        let idx: BstIndex<i32> = BstIndex::new();
        let head = leak_node(-1);
        assert_eq!(idx.search(&NaturalOrder, &5, head), head);
    }

    #[test]
    fn search_returns_closest_floor() {
        let mut idx: BstIndex<i32> = BstIndex::new();
        let head = leak_node(i32::MIN);
        let n10 = leak_node(10);
        let n20 = leak_node(20);
        let n30 = leak_node(30);
        idx.insert(&NaturalOrder, n20);
        idx.insert(&NaturalOrder, n10);
        idx.insert(&NaturalOrder, n30);

        assert_eq!(idx.search(&NaturalOrder, &25, head), n20);
        assert_eq!(idx.search(&NaturalOrder, &20, head), n20);
        assert_eq!(idx.search(&NaturalOrder, &5, head), head);
        assert_eq!(idx.search(&NaturalOrder, &100, head), n30);
    }
}
