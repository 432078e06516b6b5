//! Growable byte arena backing the packed buckets.
//!
//! The arena is addressed only through integer offsets. Growing it may move
//! the backing memory, so callers never hold an address across a `grow`; they
//! keep offsets and re-resolve them against [`ByteArena::as_slice`] on every
//! access.

use crate::error::ArenaError;

/// Largest arena the 4-byte length header can describe (header included).
pub const DEFAULT_LIMIT: usize = (u32::MAX as usize).saturating_add(HEADER_SIZE);

/// Size of the `u32` length header at the front of a packed bucket.
pub const HEADER_SIZE: usize = std::mem::size_of::<u32>();

/// An owned, contiguous byte region with a hard size ceiling.
///
/// Growth is all-or-nothing: a failed [`grow`](ByteArena::grow) leaves the
/// length, capacity and contents untouched.
#[derive(Clone, Debug)]
pub struct ByteArena {
    data: Vec<u8>,
    limit: usize,
}

impl ByteArena {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }

    /// Create an empty arena that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit: limit.min(DEFAULT_LIMIT),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Extend the arena to `new_len` bytes, zero-filling the new tail.
    ///
    /// May relocate the backing memory. Shrinking is not done here; see
    /// [`truncate`](ByteArena::truncate).
    pub fn grow(&mut self, new_len: usize) -> Result<(), ArenaError> {
        let old_len = self.data.len();
        if new_len <= old_len {
            return Ok(());
        }
        if new_len > self.limit {
            return Err(ArenaError::LimitExceeded {
                requested: new_len,
                limit: self.limit,
            });
        }
        self.data
            .try_reserve_exact(new_len - old_len)
            .map_err(|source| ArenaError::Reserve {
                requested: new_len,
                source,
            })?;
        self.data.resize(new_len, 0);
        tracing::trace!(old_len, new_len, capacity = self.data.capacity(), "arena grown");
        Ok(())
    }

    #[inline]
    pub fn truncate(&mut self, new_len: usize) {
        self.data.truncate(new_len);
    }

    /// Drop every byte and release the allocation.
    pub fn clear(&mut self) {
        self.data = Vec::new();
    }

    pub fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit();
    }

    #[inline]
    pub fn read_u32(&self, at: usize) -> u32 {
        let d = &self.data;
        u32::from_le_bytes([d[at], d[at + 1], d[at + 2], d[at + 3]])
    }

    #[inline]
    pub fn write_u32(&mut self, at: usize, value: u32) {
        self.data[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }
}

impl Default for ByteArena {
    fn default() -> Self {
        Self::new()
    }
}
