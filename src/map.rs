//! The tree container: search, insertion, deletion, and on-demand
//! rebalancing over the node graph in [`crate::node`].
//!
//! # Examples
//!
//! ```
//! use bstmap::Tree;
//!
//! let mut tree = Tree::new();
//!
//! // Nothing in here yet.
//! assert_eq!(tree.find(&1), None);
//!
//! tree.insert(1, 2);
//! assert_eq!(tree.find(&1), Some(&2));
//!
//! // Inserting a new value for the same key keeps the old value.
//! let (existing, newly_inserted) = tree.insert(1, 3);
//! assert_eq!(*existing, 2);
//! assert!(!newly_inserted);
//!
//! // Deleting a node returns its value.
//! let deleted_value = tree.delete(&1);
//!
//! assert_eq!(deleted_value, Some(2));
//! assert_eq!(tree.find(&1), None);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ptr::NonNull;

use compare::{Compare, Natural};

use crate::iter::{IntoIter, Iter, IterMut};
use crate::node::{Link, Node};

/// A map from unique keys to values, stored as a binary search tree under a
/// caller-supplied total order.
///
/// The tree never rebalances on its own: the shape is decided by insertion
/// order until [`balance`](Tree::balance) is called. The behavior of the map
/// is undefined if a key's ordering relative to any other key changes while
/// the key is in the map.
pub struct Tree<K, V, C = Natural<K>>
where
    C: Compare<K>,
{
    // This is a `Link` instead of an `Option<Box<Node>>` so that the root
    // slot and the child slots share one representation and nodes can be
    // respliced without moving in memory (parent pointers stay valid).
    root: Link<K, V>,
    len: usize,
    cmp: C,
}

impl<K, V> Tree<K, V>
where
    K: Ord,
{
    /// Generates a new, empty `Tree` ordered by the keys' natural order.
    pub fn new() -> Self {
        Self::with_cmp(compare::natural())
    }
}

impl<K, V, C> Default for Tree<K, V, C>
where
    C: Compare<K> + Default,
{
    fn default() -> Self {
        Self::with_cmp(C::default())
    }
}

impl<K, V, C> Tree<K, V, C>
where
    C: Compare<K>,
{
    /// Generates a new, empty `Tree` ordered by the given comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use compare::Compare;
    ///
    /// let mut tree = bstmap::Tree::with_cmp(compare::natural().rev());
    /// for key in [2, 1, 3] {
    ///     tree.insert(key, ());
    /// }
    ///
    /// assert_eq!(tree.to_string(), "3 2 1");
    /// ```
    pub fn with_cmp(cmp: C) -> Self {
        Self {
            root: Link(None),
            len: 0,
            cmp,
        }
    }

    /// The number of entries in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.root.0.is_none()
    }

    /// Walks from the root comparing keys until the target is found or a
    /// missing child ends the search. No allocation, no side effects.
    fn find_node(&self, key: &K) -> Option<NonNull<Node<K, V>>> {
        let mut current = self.root.0;
        while let Some(ptr) = current {
            // SAFETY: Links only ever point at live nodes owned by this
            // tree, and `&self` means no one is mutating them.
            let node = unsafe { ptr.as_ref() };
            current = match self.cmp.compare(key, &node.key) {
                Ordering::Less => node.left.0,
                Ordering::Greater => node.right.0,
                Ordering::Equal => return Some(ptr),
            };
        }
        None
    }

    /// Potentially finds the value associated with the given key in this
    /// tree. If no node has the corresponding key, `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstmap::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.insert(1, 2);
    ///
    /// assert_eq!(tree.find(&1), Some(&2));
    /// assert_eq!(tree.find(&42), None);
    /// ```
    pub fn find(&self, key: &K) -> Option<&V> {
        // SAFETY: The node is owned by this tree; the reference borrows
        // `self` for as long as the caller holds it.
        self.find_node(key)
            .map(|ptr| unsafe { &(*ptr.as_ptr()).value })
    }

    /// Like [`find`](Tree::find) but the returned value may be mutated in
    /// place.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        // SAFETY: As in `find`; `&mut self` makes the borrow exclusive.
        self.find_node(key)
            .map(|ptr| unsafe { &mut (*ptr.as_ptr()).value })
    }

    /// Whether the given key is present in the tree.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_node(key).is_some()
    }

    /// Inserts the given key and value as a new leaf, unless the key is
    /// already present. Returns a reference to the stored value and `true`
    /// iff the entry is newly inserted; an existing entry is never
    /// overwritten.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstmap::Tree;
    ///
    /// let mut tree = Tree::new();
    ///
    /// let (value, newly_inserted) = tree.insert(1, 2);
    /// assert_eq!(*value, 2);
    /// assert!(newly_inserted);
    ///
    /// let (value, newly_inserted) = tree.insert(1, 3);
    /// assert_eq!(*value, 2);
    /// assert!(!newly_inserted);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        self.insert_with(key, move || value)
    }

    /// Like [`insert`](Tree::insert), except the value is constructed by the
    /// given closure and only when the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstmap::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.insert(1, String::from("one"));
    ///
    /// // The constructor does not run for a key that is already present.
    /// let (value, newly_inserted) = tree.insert_with(1, || unreachable!());
    /// assert_eq!(*value, "one");
    /// assert!(!newly_inserted);
    /// ```
    pub fn insert_with<F>(&mut self, key: K, make: F) -> (&mut V, bool)
    where
        F: FnOnce() -> V,
    {
        if let Some(found) = self.find_node(&key) {
            // SAFETY: `&mut self` gives exclusive access to the found node.
            return (unsafe { &mut (*found.as_ptr()).value }, false);
        }

        let mut new = Node::new_boxed(key, make());
        let attached = match self.root.0 {
            None => {
                // An empty tree installs the new node as root, parent-less.
                let ptr = NonNull::from(Box::leak(new));
                self.root = Link(Some(ptr));
                ptr
            }
            Some(mut current) => loop {
                // SAFETY: We walk over live owned nodes with exclusive
                // access and attach the new leaf to exactly one missing
                // child slot.
                let node = unsafe { current.as_mut() };
                if self.cmp.compares_lt(&new.key, &node.key) {
                    match node.left.0 {
                        Some(left) => current = left,
                        None => {
                            new.parent = Link(Some(current));
                            let ptr = NonNull::from(Box::leak(new));
                            node.left = Link(Some(ptr));
                            break ptr;
                        }
                    }
                } else {
                    match node.right.0 {
                        Some(right) => current = right,
                        None => {
                            new.parent = Link(Some(current));
                            let ptr = NonNull::from(Box::leak(new));
                            node.right = Link(Some(ptr));
                            break ptr;
                        }
                    }
                }
            },
        };
        self.len += 1;

        if cfg!(debug_assertions) {
            // The fresh leaf must sit on the correct side of its parent.
            let node = unsafe { attached.as_ref() };
            if let Some(parent) = node.parent.get() {
                if parent.left.0 == Some(attached) {
                    assert!(self.cmp.compares_lt(&node.key, &parent.key));
                } else {
                    assert!(self.cmp.compares_gt(&node.key, &parent.key));
                }
            }
        }

        // SAFETY: The leaf was just attached and is owned by this tree.
        (unsafe { &mut (*attached.as_ptr()).value }, true)
    }

    /// Returns a mutable reference to the value for the given key, inserting
    /// a default-constructed value first if the key is absent.
    ///
    /// Note that this mutates the tree as a side effect of a read-looking
    /// call.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstmap::Tree;
    ///
    /// let mut tree: Tree<&str, i32> = Tree::new();
    /// *tree.get_or_insert_default("hits") += 1;
    /// *tree.get_or_insert_default("hits") += 1;
    ///
    /// assert_eq!(tree.find(&"hits"), Some(&2));
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.insert_with(key, V::default).0
    }

    /// Deletes the node containing the given key from the tree and returns
    /// its value. If the tree does not contain a node with the key, nothing
    /// happens.
    ///
    /// A node with two children is replaced by its in-order successor (the
    /// left-most node of its right subtree): the successor is spliced out of
    /// its old position - it has at most one child there - and a fresh node
    /// carrying the successor's key and value takes over the deleted node's
    /// children and parent.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstmap::Tree;
    ///
    /// let mut tree = Tree::new();
    /// for key in [5, 3, 8, 1, 4, 7, 9] {
    ///     tree.insert(key, key * 10);
    /// }
    ///
    /// // 5 has two children; its successor 7 takes its place.
    /// assert_eq!(tree.delete(&5), Some(50));
    /// assert_eq!(tree.to_string(), "1 3 4 7 8 9");
    ///
    /// assert_eq!(tree.delete(&5), None);
    /// ```
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let target = self.find_node(key)?;
        // SAFETY: `target` is owned by this tree and `&mut self` gives
        // exclusive access to every link rewritten below. Each branch
        // detaches the target's children before freeing it and updates the
        // parent pointer of exactly the nodes that change owners.
        let value = unsafe {
            let slot = self.owning_slot(target);
            let node = &mut *target.as_ptr();
            match (node.left.0, node.right.0) {
                (None, None) => {
                    (*slot).0 = None;
                    Node::into_entry(target).1
                }
                (Some(_), None) | (None, Some(_)) => {
                    let mut child = if node.left.0.is_some() {
                        node.left.take()
                    } else {
                        node.right.take()
                    };
                    if let Some(child) = child.get_mut() {
                        child.parent = node.parent;
                    }
                    *slot = child;
                    Node::into_entry(target).1
                }
                (Some(_), Some(_)) => {
                    let successor = node
                        .right
                        .detach_leftmost()
                        .expect("a node with two children has a right subtree");
                    let (succ_key, succ_value) = Node::into_entry(successor);

                    // A freshly allocated replacement rather than a resplice
                    // of the successor node; one extra allocation per
                    // two-child deletion.
                    let mut replacement = Node::new_boxed(succ_key, succ_value);
                    replacement.left = node.left.take();
                    replacement.right = node.right.take();
                    replacement.parent = node.parent;
                    let replacement = NonNull::from(Box::leak(replacement));
                    (*replacement.as_ptr()).fix_left_child_parent();
                    (*replacement.as_ptr()).fix_right_child_parent();
                    (*slot).0 = Some(replacement);
                    Node::into_entry(target).1
                }
            }
        };
        self.len -= 1;
        Some(value)
    }

    /// The link that currently owns `node`: the root slot, or the matching
    /// child slot of the node's parent.
    ///
    /// # Safety
    ///
    /// `node` must be owned by this tree, and the returned pointer must not
    /// outlive the borrow of `self`.
    unsafe fn owning_slot(&mut self, node: NonNull<Node<K, V>>) -> *mut Link<K, V> {
        match (*node.as_ptr()).parent.0 {
            None => &mut self.root,
            Some(parent) => {
                let parent = &mut *parent.as_ptr();
                if parent.left.0 == Some(node) {
                    &mut parent.left
                } else {
                    &mut parent.right
                }
            }
        }
    }

    /// Drops every entry, leaving the tree empty.
    pub fn clear(&mut self) {
        self.root.drop_subtree();
        self.len = 0;
    }

    /// Rebuilds the tree into its minimal-height shape without changing its
    /// contents: the entries are drained in key order and reinserted
    /// midpoint-first, so each recursion level halves the remaining range
    /// and the result has height ⌈log2(n + 1)⌉.
    ///
    /// This is an on-demand O(n log n) rebuild; mutations never rebalance
    /// incrementally.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstmap::Tree;
    ///
    /// let mut tree = Tree::new();
    /// for key in 1..=15 {
    ///     tree.insert(key, ());
    /// }
    ///
    /// // Ascending insertion degenerates into a list.
    /// assert_eq!(tree.height(), 15);
    ///
    /// tree.balance();
    /// assert_eq!(tree.height(), 4);
    /// ```
    pub fn balance(&mut self) {
        let mut entries: Vec<Option<(K, V)>> = Vec::with_capacity(self.len);
        while let Some(node) = self.root.detach_leftmost() {
            // SAFETY: `detach_leftmost` unlinked the node and cleared its
            // children, so this tree no longer references it.
            entries.push(Some(unsafe { Node::into_entry(node) }));
        }
        self.len = 0;

        let end = entries.len();
        self.rebuild(&mut entries, 0, end);
    }

    /// Reinserts `entries[lo..hi]` midpoint-first through `insert`.
    fn rebuild(&mut self, entries: &mut [Option<(K, V)>], lo: usize, hi: usize) {
        if lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (key, value) = entries[mid]
                .take()
                .expect("every drained slot is reinserted exactly once");
            self.insert(key, value);
            self.rebuild(entries, lo, mid);
            self.rebuild(entries, mid + 1, hi);
        }
    }

    /// Longest root-to-leaf path; 0 for an empty tree. A diagnostic, walks
    /// the whole tree.
    pub fn height(&self) -> usize {
        self.root.height()
    }

    /// The entry with the smallest key, or `None` for an empty tree.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let ptr = self.root.leftmost().0?;
        // SAFETY: The node is owned by this tree and borrowed for `&self`.
        let node = unsafe { &*ptr.as_ptr() };
        Some((&node.key, &node.value))
    }

    /// Visits the entries in ascending key order. An empty tree's iterator
    /// is immediately exhausted.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstmap::Tree;
    ///
    /// let mut tree = Tree::new();
    /// for key in [2, 1, 3] {
    ///     tree.insert(key, key * 10);
    /// }
    ///
    /// let entries: Vec<_> = tree.iter().map(|(k, v)| (*k, *v)).collect();
    /// assert_eq!(entries, [(1, 10), (2, 20), (3, 30)]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.leftmost(), self.len)
    }

    /// Like [`iter`](Tree::iter) but the values may be mutated in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use bstmap::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.insert(1, 10);
    /// tree.insert(2, 20);
    ///
    /// for (_key, value) in tree.iter_mut() {
    ///     *value += 1;
    /// }
    ///
    /// assert_eq!(tree.find(&1), Some(&11));
    /// assert_eq!(tree.find(&2), Some(&21));
    /// ```
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.root.leftmost(), self.len)
    }
}

impl<K, V, C> Drop for Tree<K, V, C>
where
    C: Compare<K>,
{
    fn drop(&mut self) {
        self.root.drop_subtree();
    }
}

impl<K, V, C> Clone for Tree<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K> + Clone,
{
    /// Deep-copies the whole node graph; the copy shares nothing with the
    /// original and its parent pointers refer to its own nodes.
    fn clone(&self) -> Self {
        let root = self.root.get().map(|root| root.clone_subtree(Link(None)));
        Self {
            root: Link(root),
            len: self.len,
            cmp: self.cmp.clone(),
        }
    }
}

impl<K, V, C> fmt::Debug for Tree<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Compare<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree").field("root", &self.root.get()).finish()
    }
}

impl<K, V, C> fmt::Display for Tree<K, V, C>
where
    K: fmt::Display,
    C: Compare<K>,
{
    /// The keys in ascending order, separated by spaces. A diagnostic
    /// rendering, not a stable format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, _) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}")?;
            first = false;
        }
        Ok(())
    }
}

impl<'a, K, V, C> IntoIterator for &'a Tree<K, V, C>
where
    C: Compare<K>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut Tree<K, V, C>
where
    C: Compare<K>,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, C> IntoIterator for Tree<K, V, C>
where
    C: Compare<K>,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> IntoIter<K, V> {
        let root = self.root.take();
        let remaining = self.len;
        // The root is already detached, so the tree's `Drop` frees nothing.
        self.len = 0;
        IntoIter::new(root, remaining)
    }
}

#[cfg(test)]
impl<K, V, C> Tree<K, V, C>
where
    C: Compare<K>,
{
    /// Walks the whole tree checking the ordering invariant between each
    /// node and its children, that every child's parent pointer names its
    /// owner, and that `len` matches the reachable node count.
    fn check_invariants(&self) {
        fn walk<K, V, C: Compare<K>>(link: &Link<K, V>, cmp: &C, count: &mut usize) {
            if let Some(node) = link.get() {
                *count += 1;
                let ptr = NonNull::from(node);
                if let Some(left) = node.left.get() {
                    assert!(cmp.compares_lt(&left.key, &node.key));
                    assert_eq!(left.parent.0, Some(ptr));
                }
                if let Some(right) = node.right.get() {
                    assert!(cmp.compares_gt(&right.key, &node.key));
                    assert_eq!(right.parent.0, Some(ptr));
                }
                walk(&node.left, cmp, count);
                walk(&node.right, cmp, count);
            }
        }

        let mut count = 0;
        walk(&self.root, &self.cmp, &mut count);
        assert_eq!(count, self.len);
        if let Some(root) = self.root.get() {
            assert!(root.parent.0.is_none());
        }
    }
}
