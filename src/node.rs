//! The ownership graph underneath [`Tree`](crate::map::Tree): heap nodes
//! that exclusively own their children and keep a non-owning pointer back to
//! their parent.
//!
//! A [`Link`] is an owning edge: it holds a `NonNull` to a `Box`-allocated
//! [`Node`] and the container decides when to free it. The parent pointer is
//! for navigation and splice bookkeeping only and is never dropped through.
//! Whenever a node changes owners, its parent pointer is rewritten in the
//! same operation.

use std::fmt;
use std::ptr::NonNull;

/// An owning edge in the tree: either empty or a pointer to a heap node.
///
/// This is a bare pointer wrapper rather than an `Option<Box<Node>>` so that
/// parent pointers and child slots share one representation and so nodes can
/// be respliced without moving them in memory.
pub(crate) struct Link<K, V>(pub(crate) Option<NonNull<Node<K, V>>>);

impl<K, V> Clone for Link<K, V> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}
impl<K, V> Copy for Link<K, V> {}

impl<K, V> Link<K, V> {
    pub(crate) fn get(&self) -> Option<&Node<K, V>> {
        // SAFETY: If the link is not `None` then it points at a live `Node`.
        // Because we take `&self` here, there can be no aliasing with
        // `self.get_mut()` - only with unsafe code that dereferences the raw
        // pointer directly, where it is the caller's responsibility to ensure
        // there is no existing borrow.
        unsafe { self.0.as_ref().map(|ptr| ptr.as_ref()) }
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut Node<K, V>> {
        // SAFETY: If the link is not `None` then it points at a live `Node`.
        // Because we take `&mut self` here, there can be no aliasing with
        // `self.get()`/`get_mut()` - only with unsafe code that dereferences
        // the raw pointer directly, where it is the caller's responsibility
        // to ensure there is no existing borrow.
        unsafe { self.0.as_mut().map(|ptr| ptr.as_mut()) }
    }

    pub(crate) fn take(&mut self) -> Self {
        Self(self.0.take())
    }

    /// The left-most link reachable from this one: `self` if the node has no
    /// left child, empty if `self` is empty.
    pub(crate) fn leftmost(&self) -> Self {
        let mut current = self.0;
        while let Some(ptr) = current {
            // SAFETY: Links always point at live nodes owned by the same
            // tree and we only read here.
            let left = unsafe { ptr.as_ref() }.left.0;
            match left {
                Some(_) => current = left,
                None => break,
            }
        }
        Self(current)
    }

    /// Detaches the left-most node reachable from this slot, splicing that
    /// node's right child (it cannot have a left one) into its place. The
    /// returned node leaves with all three of its links cleared.
    pub(crate) fn detach_leftmost(&mut self) -> Option<NonNull<Node<K, V>>> {
        self.0?;
        let mut slot: *mut Link<K, V> = self;
        // SAFETY: `slot` always points either at `self` or at the `left`
        // link of a node reachable from `self`. Nothing else is borrowed
        // while we walk, and every dereference is of a live owned node.
        unsafe {
            while let Some(node) = (*slot).0 {
                if (*node.as_ptr()).left.0.is_none() {
                    break;
                }
                slot = &mut (*node.as_ptr()).left;
            }
            let mut leftmost = (*slot).0.take().expect("non-empty slot has a left-most node");
            let node = leftmost.as_mut();
            let mut lifted = node.right.take();
            if let Some(child) = lifted.get_mut() {
                child.parent = node.parent;
            }
            *slot = lifted;
            node.parent = Link(None);
            Some(leftmost)
        }
    }

    /// Releases every node reachable from this link. Recursion depth is the
    /// height of the subtree.
    pub(crate) fn drop_subtree(&mut self) {
        if let Some(ptr) = self.0.take() {
            // SAFETY: We own the subtree being dropped so nothing frees it
            // twice, and the node was allocated with `Box::new` (in
            // `Node::new_boxed`) so it is well aligned, etc.
            let mut node = unsafe { Box::from_raw(ptr.as_ptr()) };
            node.left.drop_subtree();
            node.right.drop_subtree();
        }
    }

    /// Longest root-to-leaf path in the subtree hanging off this link.
    pub(crate) fn height(&self) -> usize {
        match self.get() {
            None => 0,
            Some(node) => 1 + node.left.height().max(node.right.height()),
        }
    }
}

/// A key/value pair plus its position in the tree. The key never changes
/// after construction; position does, and every resplice updates the moved
/// node's `parent` in the same step.
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    pub(crate) parent: Link<K, V>,
}

impl<K, V> fmt::Debug for Node<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("left", &self.left.get())
            .field("right", &self.right.get())
            .finish()
    }
}

impl<K, V> Node<K, V> {
    pub(crate) fn new_boxed(key: K, value: V) -> Box<Self> {
        Box::new(Node {
            key,
            value,
            left: Link(None),
            right: Link(None),
            parent: Link(None),
        })
    }

    /// Re-aims the left child's parent pointer at `self`. Needed after a
    /// splice hands `self` a child it didn't have before.
    pub(crate) fn fix_left_child_parent(&mut self) {
        let self_ptr = NonNull::from(&*self);
        if let Some(left) = self.left.get_mut() {
            left.parent = Link(Some(self_ptr));
        }
    }

    /// Re-aims the right child's parent pointer at `self`.
    pub(crate) fn fix_right_child_parent(&mut self) {
        let self_ptr = NonNull::from(&*self);
        if let Some(right) = self.right.get_mut() {
            right.parent = Link(Some(self_ptr));
        }
    }

    /// The in-order successor: the left-most node of the right subtree when
    /// there is one, otherwise the first ancestor reached from a left child.
    pub(crate) fn successor(&self) -> Link<K, V> {
        if self.right.0.is_some() {
            return self.right.leftmost();
        }
        let mut child = NonNull::from(self);
        let mut parent = self.parent;
        while let Some(ptr) = parent.0 {
            // SAFETY: A parent pointer always names the live node that
            // currently owns `child`.
            let node = unsafe { ptr.as_ref() };
            if node.left.0 == Some(child) {
                return parent;
            }
            child = ptr;
            parent = node.parent;
        }
        Link(None)
    }

    /// Frees the node and hands back its key and value.
    ///
    /// # Safety
    ///
    /// The caller must own `node` exclusively, must already have detached
    /// both of its children (they are not freed here), and must never
    /// dereference the pointer again.
    pub(crate) unsafe fn into_entry(node: NonNull<Self>) -> (K, V) {
        let node = *Box::from_raw(node.as_ptr());
        (node.key, node.value)
    }
}

impl<K, V> Node<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Deep-copies the subtree rooted at `self`, attaching the copy under
    /// `parent`. Children are cloned with their parent pointers already
    /// aimed at the fresh node, so the copy never holds a pointer into the
    /// original.
    pub(crate) fn clone_subtree(&self, parent: Link<K, V>) -> NonNull<Self> {
        let mut copy = Self::new_boxed(self.key.clone(), self.value.clone());
        copy.parent = parent;
        let ptr = NonNull::from(Box::leak(copy));
        // SAFETY: `ptr` was just leaked from a live box and nothing else
        // references it yet.
        unsafe {
            if let Some(left) = self.left.get() {
                (*ptr.as_ptr()).left = Link(Some(left.clone_subtree(Link(Some(ptr)))));
            }
            if let Some(right) = self.right.get() {
                (*ptr.as_ptr()).right = Link(Some(right.clone_subtree(Link(Some(ptr)))));
            }
        }
        ptr
    }
}
