use crate::alphabet;
use crate::length::{capacity, code_length};
use burrow_core::{SequenceSeed, SequenceState};
use typed_builder::TypedBuilder;

/// The linear-congruential permutation that obfuscates the sequence.
///
/// Each step computes `(a * prior + b) mod 64^L`, where `L` is the code
/// length for the current counter. Every modulus is a power of two no larger
/// than `2^60`, so it divides `2^64`: wrapping `u64` arithmetic followed by
/// masking the low `6L` bits gives exactly the result of wide arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct Lcg {
    a: u64,
    b: u64,
}

/// One permutation output and the code length it was reduced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub output: u64,
    pub length: usize,
}

impl Step {
    /// The code this step encodes to.
    pub fn encode(&self) -> String {
        alphabet::encode(self.output, self.length)
    }
}

impl Lcg {
    pub fn from_seed(seed: &SequenceSeed) -> Self {
        Self {
            a: seed.a,
            b: seed.b,
        }
    }

    pub fn a(&self) -> u64 {
        self.a
    }

    pub fn b(&self) -> u64 {
        self.b
    }

    /// Computes the output that follows `state`.
    pub fn next(&self, state: SequenceState) -> Step {
        let length = code_length(state.counter);
        Step {
            output: permute(state.counter, state.last_output, self.a, self.b),
            length,
        }
    }

    /// Whether every tier is walked without repeats.
    ///
    /// For a power-of-two modulus this holds iff `b` is odd and
    /// `a ≡ 1 (mod 4)`.
    pub fn has_full_period(&self) -> bool {
        self.b & 1 == 1 && self.a & 3 == 1
    }
}

/// `(a * prior + b) mod 64^code_length(counter)`.
pub fn permute(counter: u64, prior: u64, a: u64, b: u64) -> u64 {
    let mask = capacity(code_length(counter)) - 1;
    a.wrapping_mul(prior).wrapping_add(b) & mask
}
