//! Slot-selection hash functions.
//!
//! Hash values are only used to pick a slot. They are deterministic within a
//! process but nothing promises they stay the same across crate versions.

/// Maps key bytes to a 32-bit hash.
pub trait KeyHasher {
    fn hash(&self, key: &[u8]) -> u32;
}

impl<F> KeyHasher for F
where
    F: Fn(&[u8]) -> u32,
{
    #[inline]
    fn hash(&self, key: &[u8]) -> u32 {
        self(key)
    }
}

// =============================================================================
// MurmurHash3 (x86_32)
// =============================================================================

/// MurmurHash3, 32-bit x86 variant. The default hasher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Murmur3 {
    seed: u32,
}

impl Murmur3 {
    pub const DEFAULT_SEED: u32 = 0x911C_9DC5;

    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    pub const fn with_seed(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    fn mix_k1(mut k1: u32) -> u32 {
        k1 = k1.wrapping_mul(Self::C1);
        k1 = k1.rotate_left(15);
        k1.wrapping_mul(Self::C2)
    }

    #[inline]
    fn fmix32(mut h: u32) -> u32 {
        h ^= h >> 16;
        h = h.wrapping_mul(0x85eb_ca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2_ae35);
        h ^= h >> 16;
        h
    }
}

impl Default for Murmur3 {
    fn default() -> Self {
        Self::with_seed(Self::DEFAULT_SEED)
    }
}

impl KeyHasher for Murmur3 {
    fn hash(&self, key: &[u8]) -> u32 {
        let mut h1 = self.seed;

        let mut blocks = key.chunks_exact(4);
        for block in &mut blocks {
            let k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
            h1 ^= Self::mix_k1(k1);
            h1 = h1.rotate_left(13);
            h1 = h1.wrapping_mul(5).wrapping_add(0xe654_6b64);
        }

        let tail = blocks.remainder();
        if !tail.is_empty() {
            let mut k1 = 0u32;
            for (i, &b) in tail.iter().enumerate() {
                k1 ^= u32::from(b) << (8 * i);
            }
            h1 ^= Self::mix_k1(k1);
        }

        // Length is folded in modulo 2^32, as the reference does.
        h1 ^= key.len() as u32;
        Self::fmix32(h1)
    }
}

// =============================================================================
// FNV-1a
// =============================================================================

/// Fowler-Noll-Vo 1a. Simpler and slower on long keys; kept as a fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fnv1a {
    seed: u32,
}

impl Fnv1a {
    pub const PRIME: u32 = 0x0100_0193;
    pub const DEFAULT_SEED: u32 = 0x811C_9DC5;

    pub const fn with_seed(seed: u32) -> Self {
        Self { seed }
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::with_seed(Self::DEFAULT_SEED)
    }
}

impl KeyHasher for Fnv1a {
    #[inline]
    fn hash(&self, key: &[u8]) -> u32 {
        key.iter()
            .fold(self.seed, |h, &b| (h ^ u32::from(b)).wrapping_mul(Self::PRIME))
    }
}
