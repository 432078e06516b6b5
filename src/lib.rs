//! # array-hash
//!
//! A cache-conscious hash table for byte-string keys and small fixed-size
//! values.
//!
//! Every slot of the table owns a bucket store, and the table is generic over
//! which engine that is:
//!
//! - [`PackedBufferStore`] packs all entries of a slot into one contiguous
//!   buffer of `[length prefix][key][value]` records. This is the default.
//! - [`LinkedListStore`] keeps one node per entry, newest first.
//!
//! The slot count is chosen at construction (4096 by default) and never
//! changes: the table does not rehash.
//!
//! ## Example
//!
//! ```rust
//! use array_hash::ArrayHash;
//!
//! let mut table: ArrayHash<u64> = ArrayHash::new();
//! table.add("user:1001", 42).unwrap();
//! table.add(b"user:1002", 43).unwrap();
//!
//! assert_eq!(table.get("user:1001"), Some(42));
//! assert_eq!(table.len(), 2);
//!
//! for (key, value) in &table {
//!     println!("{:?} -> {}", String::from_utf8_lossy(key), value.get());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod arena;
pub mod encoding;
pub mod error;
pub mod hash;
mod iter;
pub mod store;

pub use error::{ArenaError, StoreError};
pub use hash::{Fnv1a, KeyHasher, Murmur3};
pub use iter::Iter;
pub use store::{BucketStore, LinkedListStore, PackedBufferStore, ValueRef};

use std::fmt;
use std::marker::PhantomData;

use bytemuck::Pod;

/// Slot count used when none is given.
pub const DEFAULT_SLOT_COUNT: usize = 4096;

/// Construction parameters for an [`ArrayHash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of slots. Fixed for the lifetime of the table.
    pub slot_count: usize,
    /// Ceiling, header included, on the buffer of each packed slot.
    /// Ignored by the linked-list engine.
    pub max_bucket_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            max_bucket_bytes: None,
        }
    }
}

// =============================================================================
// ArrayHash
// =============================================================================

/// Hash table from byte-string keys to `Pod` values.
///
/// `S` picks the bucket engine and `H` the slot hash. A key always lands in
/// slot `hash(key) % slot_count`.
pub struct ArrayHash<V, S = PackedBufferStore<V>, H = Murmur3> {
    slots: Vec<S>,
    hasher: H,
    count: usize,
    _marker: PhantomData<V>,
}

/// Table whose slots are packed byte buffers.
pub type PackedHashTable<V, H = Murmur3> = ArrayHash<V, PackedBufferStore<V>, H>;

/// Table whose slots are linked lists.
pub type ListHashTable<V, H = Murmur3> = ArrayHash<V, LinkedListStore<V>, H>;

impl<V: Pod, S: BucketStore<V>> ArrayHash<V, S, Murmur3> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// # Panics
    /// Panics if `slot_count` is zero.
    pub fn with_slot_count(slot_count: usize) -> Self {
        Self::with_config(Config {
            slot_count,
            ..Config::default()
        })
    }

    /// # Panics
    /// Panics if `config.slot_count` is zero.
    pub fn with_config(config: Config) -> Self {
        Self::with_hasher(config, Murmur3::default())
    }
}

impl<V: Pod, S: BucketStore<V>, H: KeyHasher> ArrayHash<V, S, H> {
    /// Create a table that selects slots with `hasher`.
    ///
    /// # Panics
    /// Panics if `config.slot_count` is zero.
    pub fn with_hasher(config: Config, hasher: H) -> Self {
        assert!(config.slot_count > 0, "slot count must be non-zero");
        let slots = (0..config.slot_count)
            .map(|_| S::with_config(&config))
            .collect();
        tracing::debug!(
            slot_count = config.slot_count,
            max_bucket_bytes = ?config.max_bucket_bytes,
            store = std::any::type_name::<S>(),
            "array hash created"
        );
        Self {
            slots,
            hasher,
            count: 0,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn slot_of(&self, key: &[u8]) -> usize {
        self.hasher.hash(key) as usize % self.slots.len()
    }

    /// Insert `value` under `key`, overwriting any existing value in place.
    ///
    /// Returns the previous value if the key was already present. On error the
    /// table is unchanged.
    pub fn add(&mut self, key: impl AsRef<[u8]>, value: V) -> error::Result<Option<V>> {
        let key = key.as_ref();
        let slot = self.slot_of(key);
        let old = self.slots[slot].add(key, value)?;
        if old.is_none() {
            self.count += 1;
        }
        Ok(old)
    }

    /// Borrow the value stored under `key`.
    ///
    /// The returned view keeps the table borrowed, so it must be dropped before
    /// the next `add` or `remove`. Packed slots may relocate on growth:
    ///
    /// ```compile_fail
    /// use array_hash::ArrayHash;
    ///
    /// let mut table: ArrayHash<u32> = ArrayHash::new();
    /// table.add("a", 1).unwrap();
    /// let value = table.find("a").unwrap();
    /// table.add("b", 2).unwrap();
    /// assert_eq!(value.get(), 1);
    /// ```
    pub fn find(&self, key: impl AsRef<[u8]>) -> Option<ValueRef<'_, V>> {
        let key = key.as_ref();
        if key.is_empty() {
            return None;
        }
        self.slots[self.slot_of(key)].find(key)
    }

    /// Copy of the value stored under `key`.
    #[inline]
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<V> {
        self.find(key).map(|value| value.get())
    }

    #[inline]
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.find(key).is_some()
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> Option<V> {
        let key = key.as_ref();
        if key.is_empty() {
            return None;
        }
        let slot = self.slot_of(key);
        let old = self.slots[slot].remove(key);
        if old.is_some() {
            self.count -= 1;
        }
        old
    }

    /// Number of entries across all slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The bucket stores, in slot order.
    pub fn slots(&self) -> &[S] {
        &self.slots
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Heap bytes held by the slot vector and every store.
    pub fn memory_usage(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<S>()
            + self.slots.iter().map(S::memory_usage).sum::<usize>()
    }

    pub fn shrink_to_fit(&mut self) {
        for store in &mut self.slots {
            store.shrink_to_fit();
        }
    }

    /// Remove every entry. The slot count is kept.
    pub fn clear(&mut self) {
        for store in &mut self.slots {
            store.clear();
        }
        self.count = 0;
    }

    pub fn iter(&self) -> Iter<'_, V, S> {
        Iter::begin(&self.slots)
    }

    /// The past-the-end position, equal to any exhausted [`Iter`] of this table.
    pub fn end(&self) -> Iter<'_, V, S> {
        Iter::end(&self.slots)
    }
}

impl<V: Pod, S: BucketStore<V>> Default for ArrayHash<V, S, Murmur3> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Pod, S: BucketStore<V> + Clone, H: KeyHasher + Clone> Clone for ArrayHash<V, S, H> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            hasher: self.hasher.clone(),
            count: self.count,
            _marker: PhantomData,
        }
    }
}

impl<V: Pod + fmt::Debug, S: BucketStore<V>, H: KeyHasher> fmt::Debug for ArrayHash<V, S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V: Pod, S: BucketStore<V>, H: KeyHasher> IntoIterator for &'a ArrayHash<V, S, H> {
    type Item = (&'a [u8], ValueRef<'a, V>);
    type IntoIter = Iter<'a, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}



#[cfg(test)]
mod proptests;
