use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use bytemuck::Pod;

use crate::store::{BucketStore, ValueRef};

/// Iterator over every entry of an [`ArrayHash`](crate::ArrayHash).
///
/// Slots are visited in index order and each slot in its store's own order.
/// The position is `(slot, cursor)`; the end position has
/// `slot == slot_count` and no cursor. Because the iterator borrows the
/// table, the table cannot change underneath it.
pub struct Iter<'a, V, S>
where
    V: Pod,
    S: BucketStore<V> + 'a,
{
    slots: &'a [S],
    slot: usize,
    cursor: Option<S::Cursor<'a>>,
    _marker: PhantomData<V>,
}

impl<'a, V, S> Iter<'a, V, S>
where
    V: Pod,
    S: BucketStore<V> + 'a,
{
    pub(crate) fn begin(slots: &'a [S]) -> Self {
        let mut iter = Self::end(slots);
        iter.seek_from(0);
        iter
    }

    pub(crate) fn end(slots: &'a [S]) -> Self {
        Self {
            slots,
            slot: slots.len(),
            cursor: None,
            _marker: PhantomData,
        }
    }

    /// Park on the first entry of the first non-empty slot at or after
    /// `start`, or on the end position.
    fn seek_from(&mut self, start: usize) {
        let slots = self.slots;
        for (idx, store) in slots.iter().enumerate().skip(start) {
            if let Some(cursor) = store.first() {
                self.slot = idx;
                self.cursor = Some(cursor);
                return;
            }
        }
        self.slot = slots.len();
        self.cursor = None;
    }

    /// The entry the iterator currently points at, without advancing.
    pub fn peek(&self) -> Option<(&'a [u8], ValueRef<'a, V>)> {
        let cursor = self.cursor?;
        let slots = self.slots;
        Some(slots[self.slot].item(cursor))
    }

    /// Slot index of the current position.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn is_end(&self) -> bool {
        self.cursor.is_none()
    }
}

impl<'a, V, S> Iterator for Iter<'a, V, S>
where
    V: Pod,
    S: BucketStore<V> + 'a,
{
    type Item = (&'a [u8], ValueRef<'a, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor?;
        let slots = self.slots;
        let store = &slots[self.slot];

        let item = store.item(cursor);
        self.cursor = store.next(cursor);
        if self.cursor.is_none() {
            self.seek_from(self.slot + 1);
        }
        Some(item)
    }
}

impl<'a, V, S> FusedIterator for Iter<'a, V, S>
where
    V: Pod,
    S: BucketStore<V> + 'a,
{
}

impl<'a, V, S> Clone for Iter<'a, V, S>
where
    V: Pod,
    S: BucketStore<V> + 'a,
{
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            slot: self.slot,
            cursor: self.cursor,
            _marker: PhantomData,
        }
    }
}

/// Positions compare equal when both the slot and the in-slot cursor match.
/// Only iterators over the same table are meaningfully comparable.
impl<'a, V, S> PartialEq for Iter<'a, V, S>
where
    V: Pod,
    S: BucketStore<V> + 'a,
{
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.cursor == other.cursor
    }
}

impl<'a, V, S> Eq for Iter<'a, V, S>
where
    V: Pod,
    S: BucketStore<V> + 'a,
{
}

impl<'a, V, S> fmt::Debug for Iter<'a, V, S>
where
    V: Pod,
    S: BucketStore<V> + 'a,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("slot", &self.slot)
            .field("cursor", &self.cursor)
            .finish()
    }
}
