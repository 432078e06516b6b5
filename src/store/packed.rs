//! Packed bucket: all entries of a slot in one contiguous buffer.
//!
//! Layout:
//!
//! ```text
//! [total_len: u32 LE][prefix][key bytes][value bytes][prefix][key bytes][value bytes]...
//! ```
//!
//! `total_len` counts every entry byte but not itself. Entries carry no
//! padding, so values are read and written unaligned. A bucket that has never
//! held an entry owns no memory at all.

use std::marker::PhantomData;
use std::mem;

use bytemuck::Pod;

use super::{BucketStore, ValueRef};
use crate::arena::{ByteArena, HEADER_SIZE};
use crate::encoding::{decode_len_prefix, encode_len_prefix, prefix_width, MAX_KEY_LEN};
use crate::error::{Result, StoreError};
use crate::Config;

/// Byte offsets of one located entry.
#[derive(Clone, Copy, Debug)]
struct Span {
    /// First byte of the length prefix.
    start: usize,
    /// First byte of the key.
    key_at: usize,
    /// First byte of the value.
    value_at: usize,
}

/// Bucket store keeping every entry in a single length-prefixed byte buffer.
pub struct PackedBufferStore<V> {
    arena: ByteArena,
    count: u32,
    _marker: PhantomData<V>,
}

impl<V: Pod> PackedBufferStore<V> {
    const VALUE_SIZE: usize = mem::size_of::<V>();

    pub fn new() -> Self {
        Self::with_arena(ByteArena::new())
    }

    /// Create a store whose buffer, header included, never exceeds `limit`
    /// bytes. Adds that would cross it fail with
    /// [`StoreError::AllocationFailure`].
    pub fn with_byte_limit(limit: usize) -> Self {
        Self::with_arena(ByteArena::with_limit(limit))
    }

    fn with_arena(arena: ByteArena) -> Self {
        Self {
            arena,
            count: 0,
            _marker: PhantomData,
        }
    }

    /// Bytes a new entry for a key of `key_len` bytes adds to [`size`](BucketStore::size).
    #[inline]
    pub fn entry_size(key_len: usize) -> usize {
        prefix_width(key_len) + key_len + Self::VALUE_SIZE
    }

    /// Offset one past the last entry byte.
    #[inline]
    fn end(&self) -> usize {
        HEADER_SIZE + self.total_len()
    }

    #[inline]
    fn total_len(&self) -> usize {
        if self.arena.is_empty() {
            0
        } else {
            self.arena.read_u32(0) as usize
        }
    }

    #[inline]
    fn span_at(&self, start: usize) -> Span {
        let (key_len, width) = decode_len_prefix(&self.arena.as_slice()[start..]);
        let key_at = start + width;
        Span {
            start,
            key_at,
            value_at: key_at + key_len,
        }
    }

    fn locate(&self, key: &[u8]) -> Option<Span> {
        if key.is_empty() || self.arena.is_empty() {
            return None;
        }

        let data = self.arena.as_slice();
        let end = self.end();
        let mut at = HEADER_SIZE;
        while at < end {
            let span = self.span_at(at);
            let stored_len = span.value_at - span.key_at;
            if stored_len == key.len() && &data[span.key_at..span.value_at] == key {
                return Some(span);
            }
            at = span.value_at + Self::VALUE_SIZE;
        }
        debug_assert_eq!(at, end, "packed bucket walked past its header length");
        None
    }

    fn append(&mut self, key: &[u8], value: V) -> Result<()> {
        let old_len = self.arena.len();
        let base = if old_len == 0 { HEADER_SIZE } else { old_len };
        let new_len = base + Self::entry_size(key.len());

        if let Err(err) = self.arena.grow(new_len) {
            tracing::warn!(
                requested = new_len,
                limit = self.arena.limit(),
                error = %err,
                "packed bucket growth failed"
            );
            return Err(err.into());
        }

        let data = self.arena.as_mut_slice();
        let mut at = base;
        at += encode_len_prefix(key.len(), &mut data[at..]);
        data[at..at + key.len()].copy_from_slice(key);
        at += key.len();
        data[at..at + Self::VALUE_SIZE].copy_from_slice(bytemuck::bytes_of(&value));
        debug_assert_eq!(at + Self::VALUE_SIZE, new_len);

        self.arena.write_u32(0, (new_len - HEADER_SIZE) as u32);
        self.count += 1;
        Ok(())
    }
}

impl<V: Pod> Default for PackedBufferStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Pod> Clone for PackedBufferStore<V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            count: self.count,
            _marker: PhantomData,
        }
    }
}

impl<V: Pod> BucketStore<V> for PackedBufferStore<V> {
    type Cursor<'a> = usize where Self: 'a;

    fn with_config(config: &Config) -> Self {
        match config.max_bucket_bytes {
            Some(limit) => Self::with_byte_limit(limit),
            None => Self::new(),
        }
    }

    fn find(&self, key: &[u8]) -> Option<ValueRef<'_, V>> {
        let span = self.locate(key)?;
        let bytes = &self.arena.as_slice()[span.value_at..span.value_at + Self::VALUE_SIZE];
        Some(ValueRef::from_bytes(bytes))
    }

    fn add(&mut self, key: &[u8], value: V) -> Result<Option<V>> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        if key.len() > MAX_KEY_LEN {
            return Err(StoreError::KeyTooLong { len: key.len() });
        }

        if let Some(span) = self.locate(key) {
            let slot =
                &mut self.arena.as_mut_slice()[span.value_at..span.value_at + Self::VALUE_SIZE];
            let old: V = bytemuck::pod_read_unaligned(slot);
            slot.copy_from_slice(bytemuck::bytes_of(&value));
            return Ok(Some(old));
        }

        self.append(key, value)?;
        Ok(None)
    }

    fn remove(&mut self, key: &[u8]) -> Option<V> {
        let span = self.locate(key)?;
        let entry_end = span.value_at + Self::VALUE_SIZE;
        let old: V = bytemuck::pod_read_unaligned(&self.arena.as_slice()[span.value_at..entry_end]);

        let len = self.arena.len();
        let width = entry_end - span.start;
        self.arena.as_mut_slice().copy_within(entry_end..len, span.start);
        self.arena.truncate(len - width);
        self.arena.write_u32(0, (len - width - HEADER_SIZE) as u32);
        self.count -= 1;
        Some(old)
    }

    /// Encoded length of all entries, excluding the 4-byte header.
    #[inline]
    fn size(&self) -> usize {
        self.total_len()
    }

    #[inline]
    fn len(&self) -> usize {
        self.count as usize
    }

    fn memory_usage(&self) -> usize {
        self.arena.capacity()
    }

    fn shrink_to_fit(&mut self) {
        self.arena.shrink_to_fit();
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.count = 0;
    }

    fn first(&self) -> Option<usize> {
        (self.total_len() > 0).then_some(HEADER_SIZE)
    }

    fn item<'a>(&'a self, cursor: usize) -> (&'a [u8], ValueRef<'a, V>) {
        let span = self.span_at(cursor);
        let data = self.arena.as_slice();
        (
            &data[span.key_at..span.value_at],
            ValueRef::from_bytes(&data[span.value_at..span.value_at + Self::VALUE_SIZE]),
        )
    }

    fn next<'a>(&'a self, cursor: usize) -> Option<usize> {
        let following = self.span_at(cursor).value_at + Self::VALUE_SIZE;
        (following < self.end()).then_some(following)
    }
}
