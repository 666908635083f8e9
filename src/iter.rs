//! In-order iteration over a [`Tree`](crate::map::Tree), driven by parent
//! back-pointers: stepping from a node to its in-order successor either
//! drops into the right subtree or climbs until it arrives from a left
//! child, so a full walk is O(n) with no auxiliary stack.

use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::node::{Link, Node};

/// Borrowing iterator over a tree's entries in ascending key order.
///
/// Created by [`Tree::iter`](crate::map::Tree::iter).
pub struct Iter<'a, K, V> {
    next: Link<K, V>,
    remaining: usize,
    marker: PhantomData<&'a Node<K, V>>,
}

impl<K, V> Iter<'_, K, V> {
    pub(crate) fn new(begin: Link<K, V>, remaining: usize) -> Self {
        Self {
            next: begin,
            remaining,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let ptr = self.next.0?;
        // SAFETY: The node is owned by the tree this iterator borrows, and
        // the borrow keeps the tree from being mutated or dropped for `'a`.
        let node = unsafe { &*ptr.as_ptr() };
        self.next = node.successor();
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Borrowing iterator over a tree's entries in ascending key order that
/// allows mutating the values.
///
/// Created by [`Tree::iter_mut`](crate::map::Tree::iter_mut).
pub struct IterMut<'a, K, V> {
    next: Link<K, V>,
    remaining: usize,
    marker: PhantomData<&'a mut Node<K, V>>,
}

impl<K, V> IterMut<'_, K, V> {
    pub(crate) fn new(begin: Link<K, V>, remaining: usize) -> Self {
        Self {
            next: begin,
            remaining,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let ptr = self.next.0?;
        // SAFETY: The node is owned by the tree this iterator exclusively
        // borrows, and an in-order walk visits each node exactly once, so
        // the yielded references never alias.
        let node = unsafe { &mut *ptr.as_ptr() };
        self.next = node.successor();
        self.remaining -= 1;
        Some((&node.key, &mut node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Consuming iterator over a tree's entries in ascending key order.
///
/// Repeatedly detaches the tree's minimum; entries that are never consumed
/// are released when the iterator is dropped.
pub struct IntoIter<K, V> {
    root: Link<K, V>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(root: Link<K, V>, remaining: usize) -> Self {
        Self { root, remaining }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let node = self.root.detach_leftmost()?;
        self.remaining -= 1;
        // SAFETY: `detach_leftmost` unlinked the node and cleared its
        // children, so nothing references it anymore.
        Some(unsafe { Node::into_entry(node) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V> Drop for IntoIter<K, V> {
    fn drop(&mut self) {
        self.root.drop_subtree();
    }
}
