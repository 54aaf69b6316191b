use std::cmp::Ordering;

use crate::index::comparator::Comparator;
use crate::index::node::Link;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    Red,
    Black,
}

/// Arena-indexed red-black tree node. Index 0 is the shared black `NIL`
/// sentinel every leaf points at, sidestepping the parent-pointer cycles a
/// `Box`-owned tree can't express in a strict-ownership language.
struct RbNode<K> {
    key: Option<K>,
    list_node: Link<K>,
    left: u32,
    right: u32,
    parent: u32,
    color: Color,
}

/// Red-black accelerator (C10): like [`super::tree::BstIndex`] but
/// self-balancing, so lookups stay `O(log n)` regardless of insertion
/// order.
pub struct RbTree<K> {
    nodes: Vec<RbNode<K>>,
    root: u32,
}

const NIL: u32 = 0;

impl<K: Clone> RbTree<K> {
    pub fn new() -> Self {
        Self {
            nodes: vec![RbNode {
                key: None,
                list_node: std::ptr::null_mut(),
                left: NIL,
                right: NIL,
                parent: NIL,
                color: Color::Black,
            }],
            root: NIL,
        }
    }

    fn color(&self, idx: u32) -> Color {
        self.nodes[idx as usize].color
    }

    fn key(&self, idx: u32) -> &K {
        self.nodes[idx as usize].key.as_ref().expect("NIL has no key")
    }

    /// Closest indexed node with key <= `key`, or `head` if the tree is
    /// empty or every indexed key is greater.
    pub fn search<C: Comparator<K>>(&self, cmp: &C, key: &K, head: Link<K>) -> Link<K> {
        let mut idx = self.root;
        let mut best = head;
        while idx != NIL {
            match cmp.compare(self.key(idx), key) {
                Ordering::Equal => return self.nodes[idx as usize].list_node,
                Ordering::Less => {
                    best = self.nodes[idx as usize].list_node;
                    idx = self.nodes[idx as usize].right;
                }
                Ordering::Greater => idx = self.nodes[idx as usize].left,
            }
        }
        best
    }

    pub fn insert<C: Comparator<K>>(&mut self, cmp: &C, list_node: Link<K>) {
        let key = unsafe { (*list_node).key().clone() };
        let z = self.nodes.len() as u32;
        self.nodes.push(RbNode {
            key: Some(key),
            list_node,
            left: NIL,
            right: NIL,
            parent: NIL,
            color: Color::Red,
        });

        if self.root == NIL {
            self.root = z;
            self.nodes[z as usize].color = Color::Black;
            return;
        }

        let mut cur = self.root;
        let mut parent = NIL;
        let mut went_left = false;
        while cur != NIL {
            parent = cur;
            went_left = cmp.compare(self.key(z), self.key(cur)) == Ordering::Less;
            cur = if went_left {
                self.nodes[cur as usize].left
            } else {
                self.nodes[cur as usize].right
            };
        }
        self.nodes[z as usize].parent = parent;
        if went_left {
            self.nodes[parent as usize].left = z;
        } else {
            self.nodes[parent as usize].right = z;
        }

        self.fixup(z);
    }

    fn rotate_left(&mut self, x: u32) {
        let y = self.nodes[x as usize].right;
        self.nodes[x as usize].right = self.nodes[y as usize].left;
        if self.nodes[y as usize].left != NIL {
            self.nodes[self.nodes[y as usize].left as usize].parent = x;
        }
        self.nodes[y as usize].parent = self.nodes[x as usize].parent;
        let px = self.nodes[x as usize].parent;
        if px == NIL {
            self.root = y;
        } else if self.nodes[px as usize].left == x {
            self.nodes[px as usize].left = y;
        } else {
            self.nodes[px as usize].right = y;
        }
        self.nodes[y as usize].left = x;
        self.nodes[x as usize].parent = y;
    }

    fn rotate_right(&mut self, x: u32) {
        let y = self.nodes[x as usize].left;
        self.nodes[x as usize].left = self.nodes[y as usize].right;
        if self.nodes[y as usize].right != NIL {
            self.nodes[self.nodes[y as usize].right as usize].parent = x;
        }
        self.nodes[y as usize].parent = self.nodes[x as usize].parent;
        let px = self.nodes[x as usize].parent;
        if px == NIL {
            self.root = y;
        } else if self.nodes[px as usize].right == x {
            self.nodes[px as usize].right = y;
        } else {
            self.nodes[px as usize].left = y;
        }
        self.nodes[y as usize].right = x;
        self.nodes[x as usize].parent = y;
    }

    fn fixup(&mut self, mut z: u32) {
        while self.nodes[z as usize].parent != NIL
            && self.color(self.nodes[z as usize].parent) == Color::Red
        {
            let parent = self.nodes[z as usize].parent;
            let grandparent = self.nodes[parent as usize].parent;
            if parent == self.nodes[grandparent as usize].left {
                let uncle = self.nodes[grandparent as usize].right;
                if self.color(uncle) == Color::Red {
                    self.nodes[parent as usize].color = Color::Black;
                    self.nodes[uncle as usize].color = Color::Black;
                    self.nodes[grandparent as usize].color = Color::Red;
                    z = grandparent;
                } else {
                    if z == self.nodes[parent as usize].right {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.nodes[z as usize].parent;
                    let grandparent = self.nodes[parent as usize].parent;
                    self.nodes[parent as usize].color = Color::Black;
                    self.nodes[grandparent as usize].color = Color::Red;
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.nodes[grandparent as usize].left;
                if self.color(uncle) == Color::Red {
                    self.nodes[parent as usize].color = Color::Black;
                    self.nodes[uncle as usize].color = Color::Black;
                    self.nodes[grandparent as usize].color = Color::Red;
                    z = grandparent;
                } else {
                    if z == self.nodes[parent as usize].left {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.nodes[z as usize].parent;
                    let grandparent = self.nodes[parent as usize].parent;
                    self.nodes[parent as usize].color = Color::Black;
                    self.nodes[grandparent as usize].color = Color::Red;
                    self.rotate_left(grandparent);
                }
            }
        }
        self.nodes[self.root as usize].color = Color::Black;
    }

    /// Black root, no red node with a red child, equal black-height on every
    /// root-to-NIL path.
    pub fn check_invariants(&self) -> bool {
        if self.root != NIL && self.color(self.root) != Color::Black {
            return false;
        }
        self.check_no_red_red(self.root) && self.black_height(self.root).is_some()
    }

    fn check_no_red_red(&self, idx: u32) -> bool {
        if idx == NIL {
            return true;
        }
        let n = &self.nodes[idx as usize];
        if n.color == Color::Red {
            if self.color(n.left) == Color::Red || self.color(n.right) == Color::Red {
                return false;
            }
        }
        self.check_no_red_red(n.left) && self.check_no_red_red(n.right)
    }

    fn black_height(&self, idx: u32) -> Option<u32> {
        if idx == NIL {
            return Some(1);
        }
        let n = &self.nodes[idx as usize];
        let left = self.black_height(n.left)?;
        let right = self.black_height(n.right)?;
        if left != right {
            return None;
        }
        Some(left + u32::from(n.color == Color::Black))
    }
}

impl<K: Clone> Default for RbTree<K> {
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
    fn maintains_invariants_across_many_inserts() {
        let mut tree: RbTree<i32> = RbTree::new();
        for key in 0..500 {
            // ascending order is the adversarial case for an unbalanced BST
            tree.insert(&NaturalOrder, leak_node(key));
            assert!(tree.check_invariants(), "violated after inserting {key}");
        }
    }

    #[test]
    fn search_returns_closest_floor() {
        let mut tree: RbTree<i32> = RbTree::new();
        let head = leak_node(i32::MIN);
        for key in [50, 20, 80, 10, 30, 70, 90] {
            tree.insert(&NaturalOrder, leak_node(key));
        }
        let found = tree.search(&NaturalOrder, &65, head);
        assert_eq!(unsafe { (*found).key() }, &50);
        assert_eq!(tree.search(&NaturalOrder, &5, head), head);
    }
}
