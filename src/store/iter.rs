use std::iter::FusedIterator;

use super::{Link, SplayTree};

/// In-order iterator over a [`SplayTree`], following parent links instead of keeping a stack.
#[derive(Debug)]
pub struct Iter<'a, T, C> {
    tree: &'a SplayTree<T, C>,
    front: Link,
    back: Link,
    remaining: usize,
}

impl<'a, T, C> Iter<'a, T, C> {
    pub(super) fn new(tree: &'a SplayTree<T, C>) -> Self {
        Self {
            tree,
            front: tree.root.map(|r| tree.leftmost(r)),
            back: tree.root.map(|r| tree.rightmost(r)),
            remaining: tree.len,
        }
    }
}

impl<'a, T, C> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let i = self.front?;
        self.front = self.tree.successor(i);
        self.remaining -= 1;
        Some(&self.tree.node(i).item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, C> DoubleEndedIterator for Iter<'a, T, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let i = self.back?;
        self.back = self.tree.predecessor(i);
        self.remaining -= 1;
        Some(&self.tree.node(i).item)
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> {}

impl<T, C> FusedIterator for Iter<'_, T, C> {}

impl<'a, T, C> IntoIterator for &'a SplayTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
