// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed per-fiber bit vectors.

use alloc::vec;
use alloc::vec::Vec;

const WORD_BITS: usize = 64;

/// A fixed-length bit vector with one bit per fiber.
///
/// Bits past `len` in the last word are always zero, so two masks compare equal
/// exactly when they have the same length and the same bits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FiberMask {
    words: Vec<u64>,
    len: usize,
}

impl FiberMask {
    /// A mask of `len` bits, all set to `value`.
    pub fn new(len: usize, value: bool) -> Self {
        let fill = if value { u64::MAX } else { 0 };
        let mut mask = Self {
            words: vec![fill; len.div_ceil(WORD_BITS)],
            len,
        };
        mask.clear_padding();
        mask
    }

    /// A mask of `len` set bits.
    pub fn all(len: usize) -> Self {
        Self::new(len, true)
    }

    /// A mask of `len` cleared bits.
    pub fn none(len: usize) -> Self {
        Self::new(len, false)
    }

    /// A mask copying a slice of booleans.
    pub fn from_bools(bits: &[bool]) -> Self {
        let mut mask = Self::none(bits.len());
        for (i, &b) in bits.iter().enumerate() {
            if b {
                mask.insert(i);
            }
        }
        mask
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the mask has no bits at all (zero length).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit `i`. Out-of-range indices read as `false`.
    pub fn get(&self, i: usize) -> bool {
        i < self.len && self.words[i / WORD_BITS] & (1 << (i % WORD_BITS)) != 0
    }

    /// Set bit `i` to `value`.
    ///
    /// Panics if `i` is out of range.
    pub fn set(&mut self, i: usize, value: bool) {
        assert!(i < self.len, "bit {i} out of range for mask of {}", self.len);
        let bit = 1 << (i % WORD_BITS);
        if value {
            self.words[i / WORD_BITS] |= bit;
        } else {
            self.words[i / WORD_BITS] &= !bit;
        }
    }

    /// Set bit `i`.
    pub fn insert(&mut self, i: usize) {
        self.set(i, true);
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True if every bit is set.
    pub fn is_full(&self) -> bool {
        self.count_ones() == self.len
    }

    /// Indices of the set bits, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut w = word;
            core::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(wi * WORD_BITS + bit)
            })
        })
    }

    /// Flip every bit in place.
    pub fn invert(&mut self) {
        for w in &mut self.words {
            *w = !*w;
        }
        self.clear_padding();
    }

    /// Bitwise AND with `other` in place.
    pub fn and_with(&mut self, other: &Self) {
        debug_assert_eq!(self.len, other.len, "mask lengths must match");
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= *b;
        }
    }

    /// Bitwise OR with `other` in place.
    pub fn or_with(&mut self, other: &Self) {
        debug_assert_eq!(self.len, other.len, "mask lengths must match");
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
    }

    /// Unpack into one boolean per bit.
    pub fn to_bools(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.get(i)).collect()
    }

    fn clear_padding(&mut self) {
        let tail = self.len % WORD_BITS;
        if tail != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1 << tail) - 1;
        }
    }
}
