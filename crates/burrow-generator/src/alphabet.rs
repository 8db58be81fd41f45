use crate::length::{capacity, MAX_LENGTH};
use thiserror::Error;

/// The 64 code symbols, indexed by 6-bit value.
///
/// The order is part of the on-disk format: codes written by one deployment
/// must mean the same thing to every other, so it never changes.
pub const ALPHABET: &[u8; 64] = b"0123456789-abcdefghijklmnopqrstuvwxyz_ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const SYMBOL_BITS: usize = 6;
const SYMBOL_MASK: u64 = 0x3f;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("code is empty")]
    Empty,
    #[error("code has {len} symbols; at most 10 are supported")]
    TooLong { len: usize },
    #[error("invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { symbol: char, position: usize },
}

/// Encodes `value` as exactly `length` symbols, most significant first.
///
/// Callers must keep `value < 64^length`; higher bits are dropped.
pub fn encode(value: u64, length: usize) -> String {
    debug_assert!(value < capacity(length), "{value} does not fit {length} symbols");

    (0..length)
        .rev()
        .map(|i| ALPHABET[((value >> (SYMBOL_BITS * i)) & SYMBOL_MASK) as usize] as char)
        .collect()
}

/// Inverse of [`encode`].
pub fn decode(code: &str) -> Result<u64, DecodeError> {
    if code.is_empty() {
        return Err(DecodeError::Empty);
    }
    let len = code.chars().count();
    if len > MAX_LENGTH {
        return Err(DecodeError::TooLong { len });
    }

    code.chars().enumerate().try_fold(0_u64, |acc, (position, symbol)| {
        let index = symbol_index(symbol).ok_or(DecodeError::InvalidSymbol { symbol, position })?;
        Ok((acc << SYMBOL_BITS) | index)
    })
}

fn symbol_index(symbol: char) -> Option<u64> {
    let byte = u8::try_from(symbol).ok()?;
    ALPHABET
        .iter()
        .position(|&c| c == byte)
        .map(|index| index as u64)
}
