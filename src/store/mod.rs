//! Per-slot bucket stores.
//!
//! Each slot of an [`ArrayHash`](crate::ArrayHash) owns one bucket store. Two
//! engines share the [`BucketStore`] contract:
//!
//! - [`PackedBufferStore`]: every entry of the bucket lives back to back in one
//!   growable byte buffer.
//! - [`LinkedListStore`]: one heap node per entry, newest first.
//!
//! Besides find/add/remove, a store exposes a cursor protocol
//! (`first`/`item`/`next`) so the table iterator can walk either engine the
//! same way.

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

use crate::error::Result;
use crate::Config;

mod list;
mod packed;

pub use list::{LinkedListStore, NodeCursor};
pub use packed::PackedBufferStore;

/// Storage engine for the entries of a single slot.
///
/// Keys are unique within a store: adding an existing key overwrites its
/// value in place.
pub trait BucketStore<V: Pod>: Sized {
    /// Position of one entry inside the store.
    ///
    /// A cursor is only meaningful for the store that produced it, and only
    /// until that store is next mutated.
    type Cursor<'a>: Copy + Eq + fmt::Debug
    where
        Self: 'a;

    /// Create an empty store configured from the table's [`Config`].
    fn with_config(config: &Config) -> Self;

    /// Look up `key`. Empty keys are never found.
    fn find(&self, key: &[u8]) -> Option<ValueRef<'_, V>>;

    /// Insert or overwrite `key`.
    ///
    /// Returns the previous value when the key already existed. On error the
    /// store is left exactly as it was.
    fn add(&mut self, key: &[u8], value: V) -> Result<Option<V>>;

    /// Remove `key`, returning its value if it was present.
    fn remove(&mut self, key: &[u8]) -> Option<V>;

    /// Engine-defined footprint.
    ///
    /// For the packed store this is the encoded byte length of all entries;
    /// for the list store it is the entry count.
    fn size(&self) -> usize;

    /// Number of entries.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Heap bytes held by the store.
    fn memory_usage(&self) -> usize;

    fn shrink_to_fit(&mut self) {}

    /// Drop every entry.
    fn clear(&mut self);

    /// Cursor at the first entry, or `None` for an empty store.
    fn first(&self) -> Option<Self::Cursor<'_>>;

    /// Key and value at `cursor`.
    fn item<'a>(&'a self, cursor: Self::Cursor<'a>) -> (&'a [u8], ValueRef<'a, V>);

    /// Cursor following `cursor`, or `None` past the last entry.
    fn next<'a>(&'a self, cursor: Self::Cursor<'a>) -> Option<Self::Cursor<'a>>;
}

/// A borrowed view of a stored value.
///
/// The view borrows the store it came from, so the store cannot be mutated
/// while the view is alive. Packed buckets keep values unaligned, which is why
/// this is a byte view rather than a `&V`.
pub struct ValueRef<'a, V> {
    bytes: &'a [u8],
    _marker: PhantomData<V>,
}

impl<'a, V: Pod> ValueRef<'a, V> {
    #[inline]
    pub(crate) fn from_bytes(bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len(), std::mem::size_of::<V>());
        Self {
            bytes,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn from_value(value: &'a V) -> Self {
        Self::from_bytes(bytemuck::bytes_of(value))
    }

    /// Copy the value out.
    #[inline]
    pub fn get(&self) -> V {
        bytemuck::pod_read_unaligned(self.bytes)
    }

    /// The raw value bytes as stored.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<V> Clone for ValueRef<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ValueRef<'_, V> {}

impl<V: Pod + fmt::Debug> fmt::Debug for ValueRef<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueRef").field(&self.get()).finish()
    }
}

impl<V: Pod + PartialEq> PartialEq<V> for ValueRef<'_, V> {
    fn eq(&self, other: &V) -> bool {
        self.get() == *other
    }
}
