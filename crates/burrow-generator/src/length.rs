/// Longest code the sequence produces.
pub const MAX_LENGTH: usize = 10;

/// Exclusive upper index of each tier. Tier `i` holds `64^(i+1)` indices and
/// starts where tier `i - 1` ends.
pub const TIER_BOUNDS: [u64; MAX_LENGTH] = tier_bounds();

/// First counter value past the last tier, `Σ 64^k` for `k = 1..=10`.
pub const SEQUENCE_CEILING: u64 = TIER_BOUNDS[MAX_LENGTH - 1];

const fn tier_bounds() -> [u64; MAX_LENGTH] {
    let mut bounds = [0; MAX_LENGTH];
    let mut total = 0_u64;
    let mut i = 0;
    while i < MAX_LENGTH {
        total += 1 << (6 * (i + 1));
        bounds[i] = total;
        i += 1;
    }
    bounds
}

/// Number of symbols needed for the code at allocation `index`.
///
/// Saturates at [`MAX_LENGTH`] for indices at or past [`SEQUENCE_CEILING`].
pub fn code_length(index: u64) -> usize {
    TIER_BOUNDS
        .iter()
        .position(|&bound| index < bound)
        .map_or(MAX_LENGTH, |tier| tier + 1)
}

/// Number of distinct codes of `length` symbols, `64^length`.
pub fn capacity(length: usize) -> u64 {
    debug_assert!((1..=MAX_LENGTH).contains(&length));
    1 << (6 * length)
}
