// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Find-next-set-bit traversal of bit-packed spike words
//!
//! Spike words are packed most-significant bit first: neuron `i` of a word
//! lives at bit `31 - i`. A leading-zero count therefore gives the distance to
//! the next firing neuron directly, and the traversal costs one step per
//! spike plus one per word instead of one per neuron.

/// Width of a spike word in bits
pub const WORD_BITS: u32 = u32::BITS;

/// Bit mask selecting neuron `index` (0-based, MSB first) within a word
#[inline(always)]
pub const fn neuron_bit(index: u32) -> u32 {
    0x8000_0000 >> index
}

/// Number of words needed to hold `neurons` bits
#[inline(always)]
pub const fn words_for(neurons: u32) -> usize {
    neurons.div_ceil(WORD_BITS) as usize
}

/// Distance from the top of `word` to its first set bit, if that bit lies
/// within the first `limit` positions
///
/// `limit` is the number of meaningful bits left in the word; any set bit at
/// or beyond it is padding and is reported as `None`. An all-zero word yields
/// a count of 32, which is never below a valid limit.
#[inline(always)]
pub fn find_next_set_bit(word: u32, limit: u32) -> Option<u32> {
    let skip = word.leading_zeros();
    if skip < limit {
        Some(skip)
    } else {
        None
    }
}

/// Iterator over the absolute column of every firing neuron
///
/// Each population starts on a fresh word and contributes exactly its
/// declared number of columns. Bits past the declared length of a
/// population's last word are never reported.
#[derive(Debug, Clone)]
pub struct FiringColumns<'a> {
    words: &'a [u32],
    population_lengths: &'a [u32],
    next_population: usize,
    next_word: usize,
    population_remaining: u32,
    word: u32,
    word_remaining: u32,
    column: usize,
}

impl<'a> FiringColumns<'a> {
    pub fn new(words: &'a [u32], population_lengths: &'a [u32]) -> Self {
        Self {
            words,
            population_lengths,
            next_population: 0,
            next_word: 0,
            population_remaining: 0,
            word: 0,
            word_remaining: 0,
            column: 0,
        }
    }
}

impl Iterator for FiringColumns<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.word_remaining > 0 {
                match find_next_set_bit(self.word, self.word_remaining) {
                    Some(skip) => {
                        let fired = self.column + skip as usize;
                        // Consume the skipped neurons and the one that fired
                        let consumed = skip + 1;
                        self.column = fired + 1;
                        self.population_remaining -= consumed;
                        self.word_remaining -= consumed;
                        self.word = self.word.checked_shl(consumed).unwrap_or(0);
                        return Some(fired);
                    }
                    None => {
                        self.column += self.word_remaining as usize;
                        self.population_remaining -= self.word_remaining;
                        self.word_remaining = 0;
                    }
                }
            }

            if self.population_remaining > 0 {
                self.word = *self.words.get(self.next_word)?;
                self.next_word += 1;
                self.word_remaining = self.population_remaining.min(WORD_BITS);
                continue;
            }

            let length = *self.population_lengths.get(self.next_population)?;
            self.next_population += 1;
            self.population_remaining = length;
        }
    }
}
