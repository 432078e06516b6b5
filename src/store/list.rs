//! Linked bucket: one heap node per entry, newest at the head.

use std::fmt;
use std::mem;

use bytemuck::Pod;
use smallvec::SmallVec;

use super::{BucketStore, ValueRef};
use crate::error::{Result, StoreError};
use crate::Config;

/// Keys up to this many bytes live inside the node allocation itself.
const INLINE_KEY_LEN: usize = 16;

type Link<V> = Option<Box<Node<V>>>;

struct Node<V> {
    key: SmallVec<[u8; INLINE_KEY_LEN]>,
    value: V,
    next: Link<V>,
}

impl<V> Node<V> {
    #[inline]
    fn matches(&self, key: &[u8]) -> bool {
        self.key.len() == key.len() && self.key.as_slice() == key
    }
}

/// Bucket store backed by a singly linked list.
///
/// New keys are pushed at the head, so a walk visits the most recently
/// inserted entry first. Each node owns its successor.
pub struct LinkedListStore<V> {
    head: Link<V>,
    len: usize,
}

impl<V: Pod> LinkedListStore<V> {
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    fn node(&self, key: &[u8]) -> Option<&Node<V>> {
        if key.is_empty() {
            return None;
        }
        let mut cur = self.head.as_deref();
        while let Some(node) = cur {
            if node.matches(key) {
                return Some(node);
            }
            cur = node.next.as_deref();
        }
        None
    }

    fn node_mut(&mut self, key: &[u8]) -> Option<&mut Node<V>> {
        let mut cur = self.head.as_deref_mut();
        while let Some(node) = cur {
            if node.matches(key) {
                return Some(node);
            }
            cur = node.next.as_deref_mut();
        }
        None
    }
}

impl<V: Pod> Default for LinkedListStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Pod> Clone for LinkedListStore<V> {
    fn clone(&self) -> Self {
        // Rebuild back to front so the clone keeps the same walk order.
        let mut entries = Vec::with_capacity(self.len);
        let mut cur = self.head.as_deref();
        while let Some(node) = cur {
            entries.push(node);
            cur = node.next.as_deref();
        }

        let mut head: Link<V> = None;
        for node in entries.into_iter().rev() {
            head = Some(Box::new(Node {
                key: node.key.clone(),
                value: node.value,
                next: head,
            }));
        }
        Self { head, len: self.len }
    }
}

impl<V> Drop for LinkedListStore<V> {
    fn drop(&mut self) {
        // Unlink iteratively; the default recursive drop can overflow the
        // stack on long chains.
        let mut cur = self.head.take();
        while let Some(mut node) = cur {
            cur = node.next.take();
        }
    }
}

/// Cursor into a [`LinkedListStore`]. Two cursors are equal when they point
/// at the same node.
pub struct NodeCursor<'a, V>(&'a Node<V>);

impl<V> Clone for NodeCursor<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for NodeCursor<'_, V> {}

impl<V> PartialEq for NodeCursor<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl<V> Eq for NodeCursor<'_, V> {}

impl<V> fmt::Debug for NodeCursor<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeCursor")
            .field(&(self.0 as *const Node<V>))
            .finish()
    }
}

impl<V: Pod> BucketStore<V> for LinkedListStore<V> {
    type Cursor<'a> = NodeCursor<'a, V> where Self: 'a;

    fn with_config(_config: &Config) -> Self {
        Self::new()
    }

    fn find(&self, key: &[u8]) -> Option<ValueRef<'_, V>> {
        self.node(key).map(|node| ValueRef::from_value(&node.value))
    }

    fn add(&mut self, key: &[u8], value: V) -> Result<Option<V>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        if let Some(node) = self.node_mut(key) {
            return Ok(Some(mem::replace(&mut node.value, value)));
        }

        self.head = Some(Box::new(Node {
            key: SmallVec::from_slice(key),
            value,
            next: self.head.take(),
        }));
        self.len += 1;
        Ok(None)
    }

    fn remove(&mut self, key: &[u8]) -> Option<V> {
        if key.is_empty() {
            return None;
        }

        // `link` is the slot that owns the node under inspection: the head
        // first, then each predecessor's `next`.
        let mut link = &mut self.head;
        while link.as_deref().map_or(false, |node| !node.matches(key)) {
            if let Some(node) = link {
                link = &mut node.next;
            }
        }

        let mut removed = link.take()?;
        *link = removed.next.take();
        self.len -= 1;
        Some(removed.value)
    }

    /// Number of entries.
    #[inline]
    fn size(&self) -> usize {
        self.len
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn memory_usage(&self) -> usize {
        let mut total = self.len * mem::size_of::<Node<V>>();
        let mut cur = self.head.as_deref();
        while let Some(node) = cur {
            if node.key.spilled() {
                total += node.key.capacity();
            }
            cur = node.next.as_deref();
        }
        total
    }

    fn clear(&mut self) {
        let mut cur = self.head.take();
        while let Some(mut node) = cur {
            cur = node.next.take();
        }
        self.len = 0;
    }

    fn first(&self) -> Option<NodeCursor<'_, V>> {
        self.head.as_deref().map(NodeCursor)
    }

    fn item<'a>(&'a self, cursor: NodeCursor<'a, V>) -> (&'a [u8], ValueRef<'a, V>) {
        let node = cursor.0;
        (node.key.as_slice(), ValueRef::from_value(&node.value))
    }

    fn next<'a>(&'a self, cursor: NodeCursor<'a, V>) -> Option<NodeCursor<'a, V>> {
        cursor.0.next.as_deref().map(NodeCursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(store: &LinkedListStore<u32>) -> Vec<(Vec<u8>, u32)> {
        let mut out = Vec::new();
        let mut cursor = store.first();
        while let Some(c) = cursor {
            let (key, value) = store.item(c);
            out.push((key.to_vec(), value.get()));
            cursor = store.next(c);
        }
        out
    }

    #[test]
    fn test_push_front_order() {
        let mut store: LinkedListStore<u32> = LinkedListStore::new();
        store.add(b"a", 1).unwrap();
        store.add(b"b", 2).unwrap();
        store.add(b"c", 3).unwrap();
        assert_eq!(
            walk(&store),
            vec![(b"c".to_vec(), 3), (b"b".to_vec(), 2), (b"a".to_vec(), 1)]
        );
        assert_eq!(store.size(), 3);
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut store: LinkedListStore<u32> = LinkedListStore::new();
        store.add(b"Test-1", 42).unwrap();
        store.add(b"Test-2", 7).unwrap();
        assert_eq!(store.add(b"Test-1", 43), Ok(Some(42)));
        assert_eq!(store.size(), 2);
        assert_eq!(store.find(b"Test-1").unwrap(), 43);
        // Overwriting does not move the node to the head.
        assert_eq!(walk(&store)[1], (b"Test-1".to_vec(), 43));
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut store: LinkedListStore<u32> = LinkedListStore::new();
        for (i, key) in [b"w", b"x", b"y", b"z"].iter().enumerate() {
            store.add(*key, i as u32).unwrap();
        }
        // Walk order: z, y, x, w.
        assert_eq!(store.remove(b"z"), Some(3));
        assert_eq!(store.remove(b"x"), Some(1));
        assert_eq!(store.remove(b"w"), Some(0));
        assert_eq!(store.remove(b"w"), None);
        assert_eq!(walk(&store), vec![(b"y".to_vec(), 2)]);
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove(b"y"), Some(2));
        assert!(store.first().is_none());
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_length_mismatch_is_not_a_match() {
        let mut store: LinkedListStore<u32> = LinkedListStore::new();
        store.add(b"abc", 1).unwrap();
        assert!(store.find(b"ab").is_none());
        assert!(store.find(b"abcd").is_none());
        assert_eq!(store.remove(b"ab"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_long_keys_spill() {
        let mut store: LinkedListStore<u32> = LinkedListStore::new();
        let long = vec![b'k'; 40_000];
        store.add(&long, 9).unwrap();
        store.add(b"short", 1).unwrap();
        assert_eq!(store.find(&long).unwrap(), 9);
        assert!(store.memory_usage() >= 40_000);
    }

    #[test]
    fn test_cursor_identity() {
        let mut store: LinkedListStore<u32> = LinkedListStore::new();
        store.add(b"a", 1).unwrap();
        store.add(b"b", 2).unwrap();
        let first = store.first().unwrap();
        assert_eq!(store.first(), Some(first));
        assert_ne!(store.next(first), Some(first));
        let second = store.next(first).unwrap();
        assert!(store.next(second).is_none());
    }

    #[test]
    fn test_clone_preserves_order() {
        let mut store: LinkedListStore<u32> = LinkedListStore::new();
        for i in 0..10u32 {
            store.add(format!("k{i}").as_bytes(), i).unwrap();
        }
        let copy = store.clone();
        assert_eq!(walk(&copy), walk(&store));
        assert_eq!(copy.len(), 10);
    }

    #[test]
    fn test_long_chain_drop() {
        let mut store: LinkedListStore<u32> = LinkedListStore::new();
        for i in 0..200_000u32 {
            // Unique keys without paying for a find over the whole chain.
            store.head = Some(Box::new(Node {
                key: SmallVec::from_slice(&i.to_le_bytes()),
                value: i,
                next: store.head.take(),
            }));
            store.len += 1;
        }
        drop(store);
    }
}
