use crate::iter::Iter;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitAnd, BitOr, BitXor};
use thiserror::Error;

const WORD_BITS: usize = 64;
const SMALL_BITS: usize = WORD_BITS;
const MID_BITS: usize = 2 * WORD_BITS;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BitKeyError {
    #[error("bit key size must be non-negative, got {0}")]
    NegativeSize(i64),
}

/// The storage layout a [`BitKey`] currently uses.
///
/// The layout only ever grows. It never takes part in equality, ordering or
/// hashing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeClass {
    /// Positions `0..=63`.
    Small,
    /// Positions `0..=127`.
    Mid,
    /// Any number of words.
    Big,
}

#[derive(Clone)]
enum Repr {
    Small(u64),
    Mid([u64; 2]),
    Big(Vec<u64>),
}

/// A set of bit positions with no fixed upper bound.
///
/// Bits are stored little-endian within each `u64` word:
/// - bit 0 is the LSB of word 0
/// - bit 64 is the LSB of word 1
///
/// Two keys are equal when they hold the same positions, whatever layout or
/// capacity each was built with. Ordering treats the key as an unsigned
/// integer, so a key with a higher top bit is greater.
#[derive(Clone)]
pub struct BitKey {
    repr: Repr,
}

fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

/// Strip trailing zero words so keys with different padding agree.
fn significant(words: &[u64]) -> &[u64] {
    let len = words
        .iter()
        .rposition(|&w| w != 0)
        .map_or(0, |idx| idx + 1);
    &words[..len]
}

impl BitKey {
    /// An empty key sized for at least `bits` positions.
    pub fn with_capacity(bits: usize) -> Self {
        let repr = if bits <= SMALL_BITS {
            Repr::Small(0)
        } else if bits <= MID_BITS {
            Repr::Mid([0; 2])
        } else {
            Repr::Big(vec![0; words_for(bits)])
        };
        Self { repr }
    }

    /// Like [`BitKey::with_capacity`], for size hints coming from signed
    /// sources such as configuration files.
    pub fn make(size: i64) -> Result<Self, BitKeyError> {
        let bits = usize::try_from(size).map_err(|_| BitKeyError::NegativeSize(size))?;
        Ok(Self::with_capacity(bits))
    }

    pub fn from_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut key = Self::with_capacity(0);
        for pos in positions {
            key.set(pos);
        }
        key
    }

    /// An empty key with the same layout and capacity as `self`.
    pub fn empty_copy(&self) -> Self {
        let repr = match &self.repr {
            Repr::Small(_) => Repr::Small(0),
            Repr::Mid(_) => Repr::Mid([0; 2]),
            Repr::Big(words) => Repr::Big(vec![0; words.len()]),
        };
        Self { repr }
    }

    pub fn size_class(&self) -> SizeClass {
        match self.repr {
            Repr::Small(_) => SizeClass::Small,
            Repr::Mid(_) => SizeClass::Mid,
            Repr::Big(_) => SizeClass::Big,
        }
    }

    /// Number of positions the current layout can hold without growing.
    pub fn capacity(&self) -> usize {
        self.words().len() * WORD_BITS
    }

    pub(crate) fn words(&self) -> &[u64] {
        match &self.repr {
            Repr::Small(word) => std::slice::from_ref(word),
            Repr::Mid(words) => words,
            Repr::Big(words) => words,
        }
    }

    fn words_mut(&mut self) -> &mut [u64] {
        match &mut self.repr {
            Repr::Small(word) => std::slice::from_mut(word),
            Repr::Mid(words) => words,
            Repr::Big(words) => words,
        }
    }

    /// The words up to and including the highest non-zero one. All
    /// comparisons go through this view.
    fn canonical_words(&self) -> &[u64] {
        significant(self.words())
    }

    fn word(&self, idx: usize) -> u64 {
        self.words().get(idx).copied().unwrap_or(0)
    }

    fn grow_to(&mut self, bits: usize) {
        if bits <= self.capacity() {
            return;
        }
        let mut grown = Self::with_capacity(bits);
        grown.words_mut()[..self.words().len()].copy_from_slice(self.words());
        *self = grown;
    }

    /// Set one position, growing the key to hold it.
    ///
    /// The key grows to `pos / 64 + 1` words, so positions are bounded by
    /// what can be allocated, not by `usize::MAX`.
    pub fn set(&mut self, pos: usize) {
        self.grow_to(pos.saturating_add(1));
        self.words_mut()[pos / WORD_BITS] |= 1u64 << (pos % WORD_BITS);
    }

    /// Clear one position. Positions beyond the capacity are already clear.
    pub fn clear_bit(&mut self, pos: usize) {
        if let Some(word) = self.words_mut().get_mut(pos / WORD_BITS) {
            *word &= !(1u64 << (pos % WORD_BITS));
        }
    }

    pub fn is_set(&self, pos: usize) -> bool {
        (self.word(pos / WORD_BITS) >> (pos % WORD_BITS)) & 1 == 1
    }

    /// Zero every bit, keeping the layout.
    pub fn clear(&mut self) {
        for word in self.words_mut() {
            *word = 0;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words().iter().all(|&w| w == 0)
    }

    pub fn cardinality(&self) -> usize {
        self.words().iter().map(|w| w.count_ones() as usize).sum()
    }

    fn combine(&self, other: &BitKey, op: impl Fn(u64, u64) -> u64) -> BitKey {
        let mut out = BitKey::with_capacity(self.capacity().max(other.capacity()));
        for (idx, word) in out.words_mut().iter_mut().enumerate() {
            *word = op(self.word(idx), other.word(idx));
        }
        out
    }

    pub fn or(&self, other: &BitKey) -> BitKey {
        self.combine(other, |a, b| a | b)
    }

    pub fn and(&self, other: &BitKey) -> BitKey {
        self.combine(other, |a, b| a & b)
    }

    /// Positions in `self` that are not in `other`.
    pub fn and_not(&self, other: &BitKey) -> BitKey {
        self.combine(other, |a, b| a & !b)
    }

    /// Positions in exactly one of `self` and `other`.
    pub fn or_not(&self, other: &BitKey) -> BitKey {
        self.combine(other, |a, b| a ^ b)
    }

    pub fn is_super_set_of(&self, other: &BitKey) -> bool {
        other
            .words()
            .iter()
            .enumerate()
            .all(|(idx, &w)| w & !self.word(idx) == 0)
    }

    pub fn intersects(&self, other: &BitKey) -> bool {
        self.words()
            .iter()
            .zip(other.words())
            .any(|(a, b)| a & b != 0)
    }

    /// The lowest set position at or after `from`, or `None` past the end.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        let words = self.words();
        let mut idx = from / WORD_BITS;
        if idx >= words.len() {
            return None;
        }
        let mut word = words[idx] & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                return Some(idx * WORD_BITS + word.trailing_zeros() as usize);
            }
            idx += 1;
            word = *words.get(idx)?;
        }
    }

    pub fn first_set_bit(&self) -> Option<usize> {
        self.next_set_bit(0)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.words())
    }

    pub fn positions(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

impl Default for BitKey {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl PartialEq for BitKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_words() == other.canonical_words()
    }
}

impl Eq for BitKey {}

impl Hash for BitKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_words().hash(state);
    }
}

impl Ord for BitKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.canonical_words();
        let b = other.canonical_words();
        // Without trailing zero words, the longer key has the higher top bit.
        a.len()
            .cmp(&b.len())
            .then_with(|| a.iter().rev().cmp(b.iter().rev()))
    }
}

impl PartialOrd for BitKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for word in self.words().iter().rev() {
            write!(f, "{word:016x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BitKey")?;
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a BitKey {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<usize> for BitKey {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_positions(iter)
    }
}

impl BitOr for &BitKey {
    type Output = BitKey;

    fn bitor(self, rhs: &BitKey) -> BitKey {
        self.or(rhs)
    }
}

impl BitAnd for &BitKey {
    type Output = BitKey;

    fn bitand(self, rhs: &BitKey) -> BitKey {
        self.and(rhs)
    }
}

impl BitXor for &BitKey {
    type Output = BitKey;

    fn bitxor(self, rhs: &BitKey) -> BitKey {
        self.or_not(rhs)
    }
}
