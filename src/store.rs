//! An ordered set backed by a splay tree.
//!
//! Nodes live in an arena and are linked by slot index, so callers hold plain [`NodeId`] handles
//! instead of pointers into the tree. Every insert, remove and `min`/`max` access rotates the
//! touched node to the root, which keeps operations amortized O(log n) and makes repeated
//! access near the minimum (the scheduler's hot path) cheap.
//!
//! Note that `min` and `max` restructure the tree and therefore take `&mut self`. The
//! `peek_*` variants walk the spine without splaying for callers that need a read-only look.

mod iter;

use std::cmp::Ordering;

use crate::{error::Error, ident::NodeId};

pub use self::iter::Iter;

/// A total order over `T`.
pub trait Compare<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders items by their `Ord` impl.
#[derive(Debug, Default, Copy, Clone)]
pub struct Natural;

impl<T: Ord + ?Sized> Compare<T> for Natural {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

type Link = Option<u32>;

#[derive(Debug)]
struct Node<T> {
    item: T,
    parent: Link,
    left: Link,
    right: Link,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

type Teardown<T> = Box<dyn FnMut(T)>;

#[derive(derivative::Derivative)]
#[derivative(Debug(bound = "T: std::fmt::Debug, C: std::fmt::Debug"))]
pub struct SplayTree<T, C> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    root: Link,
    len: usize,
    cmp: C,
    #[derivative(Debug = "ignore")]
    teardown: Option<Teardown<T>>,
}

impl<T, C> SplayTree<T, C> {
    /// Creates an empty tree. Items still present when the tree is dropped are simply dropped.
    pub fn new(cmp: C) -> Self {
        Self::with_capacity(cmp, 0)
    }

    pub fn with_capacity(cmp: C, capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            root: None,
            len: 0,
            cmp,
            teardown: None,
        }
    }

    /// Creates an empty tree that hands every item still present at teardown (drop or
    /// [`clear`](Self::clear)) to `hook`.
    pub fn with_teardown(cmp: C, hook: impl FnMut(T) + 'static) -> Self {
        let mut tree = Self::new(cmp);
        tree.teardown = Some(Box::new(hook));
        tree
    }

    pub(crate) fn set_teardown(&mut self, hook: Teardown<T>) {
        self.teardown = Some(hook);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_some()
    }

    /// Looks an item up by identity. Does not restructure the tree.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.resolve(id).map(|i| &self.node(i).item)
    }

    /// Mutable access by identity. The caller must not change how the item orders relative to
    /// the other members.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.resolve(id).map(|i| &mut self.node_mut(i).item)
    }

    /// The least item, without splaying.
    pub fn peek_min(&self) -> Option<&T> {
        self.root
            .map(|r| self.leftmost(r))
            .map(|i| &self.node(i).item)
    }

    /// The greatest item, without splaying.
    pub fn peek_max(&self) -> Option<&T> {
        self.root
            .map(|r| self.rightmost(r))
            .map(|i| &self.node(i).item)
    }

    /// The least item, splayed to the root.
    pub fn min(&mut self) -> Option<&T> {
        let i = self.leftmost(self.root?);
        self.splay(i);
        Some(&self.node(i).item)
    }

    /// The greatest item, splayed to the root.
    pub fn max(&mut self) -> Option<&T> {
        let i = self.rightmost(self.root?);
        self.splay(i);
        Some(&self.node(i).item)
    }

    /// The handle of the least item, without splaying.
    pub fn min_id(&self) -> Option<NodeId> {
        self.root.map(|r| self.id_of(self.leftmost(r)))
    }

    /// Removes and returns the least item.
    pub fn pop_min(&mut self) -> Option<T> {
        let i = self.leftmost(self.root?);
        Some(self.unlink(i))
    }

    /// Removes and returns the greatest item.
    pub fn pop_max(&mut self) -> Option<T> {
        let i = self.rightmost(self.root?);
        Some(self.unlink(i))
    }

    /// Removes a specific item by identity.
    pub fn remove(&mut self, id: NodeId) -> Result<T, Error> {
        let i = self.resolve(id).ok_or(Error::NotMember(id))?;
        Ok(self.unlink(i))
    }

    /// In-order iteration. Does not restructure the tree.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter::new(self)
    }

    /// Visits every item in ascending order with mutable access.
    ///
    /// `f` may change the items, but only in ways that keep their relative order; anything else
    /// silently breaks the tree. Debug builds verify the order afterwards.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut T))
    where
        C: Compare<T>,
    {
        let mut cur = self.root.map(|r| self.leftmost(r));
        while let Some(i) = cur {
            f(&mut self.node_mut(i).item);
            cur = self.successor(i);
        }
        debug_assert!(self.is_sorted(), "for_each_mut reordered the tree");
    }

    /// Removes every item, running the teardown hook on each (in slot order) if one is set.
    pub fn clear(&mut self) {
        let mut hook = self.teardown.take();
        for i in 0..self.slots.len() {
            if let Some(item) = self.vacate(i as u32) {
                if let Some(hook) = hook.as_mut() {
                    hook(item);
                }
            }
        }
        self.teardown = hook;
        self.root = None;
    }

    /// Consumes the tree, returning its items in ascending order. The teardown hook is not run.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        let mut cur = self.root.map(|r| self.leftmost(r));
        let order: Vec<u32> = std::iter::from_fn(|| {
            let i = cur?;
            cur = self.successor(i);
            Some(i)
        })
        .collect();
        for i in order {
            if let Some(item) = self.vacate(i) {
                out.push(item);
            }
        }
        self.root = None;
        out
    }
}

impl<T, C: Compare<T>> SplayTree<T, C> {
    /// Inserts `item` and splays it to the root.
    ///
    /// Items must be unique under the comparator; an item comparing equal to a member is
    /// rejected (and dropped) without touching the tree.
    pub fn insert(&mut self, item: T) -> Result<NodeId, Error> {
        let mut parent = None;
        let mut go_left = false;
        let mut cur = self.root;
        while let Some(i) = cur {
            parent = Some(i);
            match self.cmp.compare(&item, &self.node(i).item) {
                Ordering::Less => {
                    go_left = true;
                    cur = self.node(i).left;
                }
                Ordering::Greater => {
                    go_left = false;
                    cur = self.node(i).right;
                }
                Ordering::Equal => {
                    self.splay(i);
                    return Err(Error::DuplicateKey);
                }
            }
        }

        let i = self.alloc(Node {
            item,
            parent,
            left: None,
            right: None,
        });
        match parent {
            Some(p) if go_left => self.node_mut(p).left = Some(i),
            Some(p) => self.node_mut(p).right = Some(i),
            None => self.root = Some(i),
        }
        self.splay(i);
        Ok(self.id_of(i))
    }

    fn is_sorted(&self) -> bool {
        let mut it = self.iter();
        let Some(mut prev) = it.next() else {
            return true;
        };
        for item in it {
            if self.cmp.compare(prev, item) != Ordering::Less {
                return false;
            }
            prev = item;
        }
        true
    }
}

// Arena plumbing
impl<T, C> SplayTree<T, C> {
    fn node(&self, i: u32) -> &Node<T> {
        match &self.slots[i as usize].node {
            Some(node) => node,
            None => unreachable!("link to vacant slot {i}"),
        }
    }

    fn node_mut(&mut self, i: u32) -> &mut Node<T> {
        match &mut self.slots[i as usize].node {
            Some(node) => node,
            None => unreachable!("link to vacant slot {i}"),
        }
    }

    fn id_of(&self, i: u32) -> NodeId {
        NodeId::new(i, self.slots[i as usize].generation)
    }

    fn resolve(&self, id: NodeId) -> Option<u32> {
        let slot = self.slots.get(id.slot())?;
        (slot.generation == id.generation && slot.node.is_some()).then_some(id.index)
    }

    fn alloc(&mut self, node: Node<T>) -> u32 {
        self.len += 1;
        match self.free.pop() {
            Some(i) => {
                self.slots[i as usize].node = Some(node);
                i
            }
            None => {
                let i = u32::try_from(self.slots.len()).expect("splay tree arena exhausted");
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                i
            }
        }
    }

    // Empties a slot without fixing up links; callers either unlinked the node first or are
    // tearing the whole tree down.
    fn vacate(&mut self, i: u32) -> Option<T> {
        let slot = &mut self.slots[i as usize];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(i);
        self.len -= 1;
        Some(node.item)
    }

    /// Splays `i` to the root, detaches it, and joins its two subtrees.
    fn unlink(&mut self, i: u32) -> T {
        self.splay(i);
        let Node { left, right, .. } = *self.node(i);
        match left {
            None => {
                self.root = right;
                if let Some(r) = right {
                    self.node_mut(r).parent = None;
                }
            }
            Some(l) => {
                self.node_mut(l).parent = None;
                self.root = Some(l);
                // The maximum of the left subtree has no right child once splayed, so the right
                // subtree hangs off it directly.
                let m = self.rightmost(l);
                self.splay(m);
                self.node_mut(m).right = right;
                if let Some(r) = right {
                    self.node_mut(r).parent = Some(m);
                }
            }
        }
        match self.vacate(i) {
            Some(item) => item,
            None => unreachable!("unlinked a vacant slot"),
        }
    }

    fn leftmost(&self, mut i: u32) -> u32 {
        while let Some(l) = self.node(i).left {
            i = l;
        }
        i
    }

    fn rightmost(&self, mut i: u32) -> u32 {
        while let Some(r) = self.node(i).right {
            i = r;
        }
        i
    }

    fn successor(&self, i: u32) -> Link {
        if let Some(r) = self.node(i).right {
            return Some(self.leftmost(r));
        }
        let mut child = i;
        let mut parent = self.node(i).parent;
        while let Some(p) = parent {
            if self.node(p).left == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.node(p).parent;
        }
        None
    }

    fn predecessor(&self, i: u32) -> Link {
        if let Some(l) = self.node(i).left {
            return Some(self.rightmost(l));
        }
        let mut child = i;
        let mut parent = self.node(i).parent;
        while let Some(p) = parent {
            if self.node(p).right == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.node(p).parent;
        }
        None
    }

    /// Rotates `x` above its parent.
    fn rotate(&mut self, x: u32) {
        let Some(p) = self.node(x).parent else {
            return;
        };
        let g = self.node(p).parent;
        if self.node(p).left == Some(x) {
            let b = self.node(x).right;
            self.node_mut(p).left = b;
            if let Some(b) = b {
                self.node_mut(b).parent = Some(p);
            }
            self.node_mut(x).right = Some(p);
        } else {
            let b = self.node(x).left;
            self.node_mut(p).right = b;
            if let Some(b) = b {
                self.node_mut(b).parent = Some(p);
            }
            self.node_mut(x).left = Some(p);
        }
        self.node_mut(p).parent = Some(x);
        self.node_mut(x).parent = g;
        match g {
            Some(g) if self.node(g).left == Some(p) => self.node_mut(g).left = Some(x),
            Some(g) => self.node_mut(g).right = Some(x),
            None => self.root = Some(x),
        }
    }

    fn splay(&mut self, x: u32) {
        while let Some(p) = self.node(x).parent {
            match self.node(p).parent {
                // zig
                None => self.rotate(x),
                Some(g) => {
                    let x_left = self.node(p).left == Some(x);
                    let p_left = self.node(g).left == Some(p);
                    if x_left == p_left {
                        // zig-zig
                        self.rotate(p);
                        self.rotate(x);
                    } else {
                        // zig-zag
                        self.rotate(x);
                        self.rotate(x);
                    }
                }
            }
        }
    }
}

impl<T, C> Drop for SplayTree<T, C> {
    fn drop(&mut self) {
        if self.teardown.is_some() {
            self.clear();
        }
    }
}

#[cfg(test)]
impl<T, C: Compare<T>> SplayTree<T, C> {
    /// Panics unless links, ordering and the length counter are all consistent.
    pub(crate) fn check_invariants(&self) {
        let mut count = 0;
        if let Some(r) = self.root {
            assert_eq!(self.node(r).parent, None, "root has a parent");
            let mut stack = vec![r];
            while let Some(i) = stack.pop() {
                count += 1;
                let node = self.node(i);
                for child in [node.left, node.right].into_iter().flatten() {
                    assert_eq!(self.node(child).parent, Some(i), "broken parent link");
                    stack.push(child);
                }
                if let Some(l) = node.left {
                    let m = self.rightmost(l);
                    assert_eq!(self.cmp.compare(&self.node(m).item, &node.item), Ordering::Less);
                }
                if let Some(r) = node.right {
                    let m = self.leftmost(r);
                    assert_eq!(
                        self.cmp.compare(&self.node(m).item, &node.item),
                        Ordering::Greater
                    );
                }
            }
        }
        assert_eq!(count, self.len, "length counter out of sync");
        assert!(self.is_sorted());
    }

    pub(crate) fn root_item(&self) -> Option<&T> {
        self.root.map(|r| &self.node(r).item)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use rand::{seq::SliceRandom, Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn tree_of(items: &[i32]) -> SplayTree<i32, Natural> {
        let mut tree = SplayTree::new(Natural);
        for &x in items {
            tree.insert(x).unwrap();
        }
        tree
    }

    #[test]
    fn iterates_in_order() {
        let tree = tree_of(&[5, 1, 9, 3, 7]);
        tree.check_invariants();
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 3, 5, 7, 9]);
        assert_eq!(
            tree.iter().rev().copied().collect::<Vec<_>>(),
            vec![9, 7, 5, 3, 1]
        );
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn insert_splays_to_root() {
        let mut tree = tree_of(&[10, 20, 30]);
        assert_eq!(tree.root_item(), Some(&30));
        tree.insert(15).unwrap();
        assert_eq!(tree.root_item(), Some(&15));
        tree.check_invariants();
    }

    #[test]
    fn min_and_max_splay_but_peek_does_not() {
        let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
        let root = *tree.root_item().unwrap();

        assert_eq!(tree.peek_min(), Some(&1));
        assert_eq!(tree.peek_max(), Some(&7));
        assert_eq!(tree.root_item(), Some(&root));

        assert_eq!(tree.min(), Some(&1));
        assert_eq!(tree.root_item(), Some(&1));
        assert_eq!(tree.max(), Some(&7));
        assert_eq!(tree.root_item(), Some(&7));
        tree.check_invariants();
    }

    #[test]
    fn empty_tree() {
        let mut tree: SplayTree<i32, _> = SplayTree::new(Natural);
        assert!(tree.is_empty());
        assert_eq!(tree.min(), None);
        assert_eq!(tree.max(), None);
        assert_eq!(tree.peek_min(), None);
        assert_eq!(tree.pop_min(), None);
        assert_eq!(tree.pop_max(), None);
        assert_eq!(tree.min_id(), None);
        assert_eq!(tree.iter().next(), None);
        tree.check_invariants();
    }

    #[test]
    fn duplicate_is_rejected() {
        let mut tree = tree_of(&[1, 2, 3]);
        assert!(matches!(tree.insert(2), Err(Error::DuplicateKey)));
        assert_eq!(tree.len(), 3);
        tree.check_invariants();
    }

    #[test]
    fn remove_by_identity() {
        let mut tree = SplayTree::new(Natural);
        let ids: Vec<_> = [8, 3, 10, 1, 6, 14, 4, 7, 13]
            .into_iter()
            .map(|x| (x, tree.insert(x).unwrap()))
            .collect();
        for (x, id) in ids {
            assert_eq!(tree.get(id), Some(&x));
            assert_eq!(tree.remove(id).unwrap(), x);
            assert!(!tree.contains(id));
            tree.check_invariants();
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn stale_handle_is_not_a_member() {
        let mut tree = SplayTree::new(Natural);
        let id = tree.insert(1).unwrap();
        tree.remove(id).unwrap();

        // The slot is reused by the next insert; the old handle must not see it.
        let reused = tree.insert(2).unwrap();
        assert_eq!(reused.index, id.index);
        assert_ne!(reused, id);
        assert!(matches!(tree.remove(id), Err(Error::NotMember(h)) if h == id));
        assert_eq!(tree.get(id), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn pop_min_and_max() {
        let mut tree = tree_of(&[3, 1, 4, 5, 9, 2, 6]);
        assert_eq!(tree.pop_min(), Some(1));
        assert_eq!(tree.pop_max(), Some(9));
        assert_eq!(tree.pop_min(), Some(2));
        tree.check_invariants();
        assert_eq!(tree.into_sorted_vec(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn custom_comparator() {
        let mut tree = SplayTree::new(|a: &i32, b: &i32| b.cmp(a));
        for x in [1, 5, 3] {
            tree.insert(x).unwrap();
        }
        assert_eq!(tree.pop_min(), Some(5));
        assert_eq!(tree.peek_max(), Some(&1));
    }

    #[test]
    fn for_each_mut_visits_in_order() {
        let mut tree = tree_of(&[30, 10, 20]);
        let mut seen = Vec::new();
        tree.for_each_mut(|x| {
            seen.push(*x);
            *x -= 5;
        });
        assert_eq!(seen, vec![10, 20, 30]);
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![5, 15, 25]);
        tree.check_invariants();
    }

    #[test]
    fn teardown_runs_on_drop_and_clear() {
        let torn = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&torn);
        let mut tree = SplayTree::with_teardown(Natural, move |x: i32| sink.borrow_mut().push(x));
        for x in [2, 1, 3] {
            tree.insert(x).unwrap();
        }
        tree.pop_min();
        drop(tree);
        let mut got = torn.borrow().clone();
        got.sort();
        assert_eq!(got, vec![2, 3]);

        torn.borrow_mut().clear();
        let sink = Rc::clone(&torn);
        let mut tree = SplayTree::with_teardown(Natural, move |x: i32| sink.borrow_mut().push(x));
        let id = tree.insert(7).unwrap();
        tree.clear();
        assert_eq!(*torn.borrow(), vec![7]);
        assert!(tree.is_empty());
        assert!(!tree.contains(id));
        tree.insert(8).unwrap();
        tree.check_invariants();
    }

    #[test]
    fn into_sorted_vec_skips_teardown() {
        let torn = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&torn);
        let mut tree = SplayTree::with_teardown(Natural, move |_: i32| *sink.borrow_mut() += 1);
        tree.insert(2).unwrap();
        tree.insert(1).unwrap();
        assert_eq!(tree.into_sorted_vec(), vec![1, 2]);
        assert_eq!(*torn.borrow(), 0);
    }

    #[test]
    fn random_operations_keep_tree_valid() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        let mut tree = SplayTree::new(Natural);
        let mut live: Vec<(u32, NodeId)> = Vec::new();

        for round in 0..2_000 {
            match rng.gen_range(0..4) {
                0 | 1 => {
                    let x = rng.gen_range(0..10_000);
                    match tree.insert(x) {
                        Ok(id) => live.push((x, id)),
                        Err(Error::DuplicateKey) => assert!(live.iter().any(|&(y, _)| y == x)),
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                2 if !live.is_empty() => {
                    live.shuffle(&mut rng);
                    let (x, id) = live.pop().unwrap();
                    assert_eq!(tree.remove(id).unwrap(), x);
                }
                _ => {
                    let min = live.iter().map(|&(x, _)| x).min();
                    assert_eq!(tree.pop_min(), min);
                    if let Some(min) = min {
                        live.retain(|&(x, _)| x != min);
                    }
                }
            }
            if round % 50 == 0 {
                tree.check_invariants();
            }
        }
        tree.check_invariants();

        let mut expected: Vec<_> = live.iter().map(|&(x, _)| x).collect();
        expected.sort();
        assert_eq!(tree.into_sorted_vec(), expected);
    }
}
