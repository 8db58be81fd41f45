//! Pure code generation: the length model, the 64-symbol alphabet codec and
//! the LCG permutation.
//!
//! Nothing here touches storage. The allocation service feeds persisted
//! sequence state through [`Lcg::next`] and encodes the resulting [`Step`].

pub mod alphabet;
pub mod lcg;
pub mod length;

pub use alphabet::{decode, encode, DecodeError, ALPHABET};
pub use lcg::{permute, Lcg, Step};
pub use length::{code_length, MAX_LENGTH, SEQUENCE_CEILING};
