//! Format-level maxima for SM4/SM5 token streams.
//!
//! These bound what the token format itself can express; they are not tunable
//! implementation limits.

/// Highest register index a signature element may occupy (exclusive).
pub const MAX_SIGNATURE_REGISTER_COUNT: u32 = 32;

/// An operand carries at most three register index slots.
pub const MAX_REGISTER_INDEX_COUNT: usize = 3;

/// Relative-addressing sub-operands nest at most one level deep.
pub const MAX_RELATIVE_ADDRESS_DEPTH: u32 = 1;

/// Upper bound on the declared token count we will attempt to decode.
///
/// The length header is a 32-bit dword count; anything near this bound is a
/// hostile stream, so cap allocations well below `u32::MAX`.
pub const MAX_PROGRAM_TOKEN_COUNT: usize = 1 << 24;

/// Texel offsets are signed 4-bit immediates.
pub const MIN_TEXEL_OFFSET: i8 = -8;
/// See [`MIN_TEXEL_OFFSET`].
pub const MAX_TEXEL_OFFSET: i8 = 7;
