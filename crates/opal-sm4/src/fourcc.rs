//! Four-character section tags.

use core::fmt;

/// A four-character code identifying a named byte section.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Reads a tag from the first four bytes of `data`.
    pub fn from_bytes(data: [u8; 4]) -> Self {
        Self(data)
    }

    /// Returns the tag as little-endian bytes.
    pub fn to_bytes(self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Input signature.
pub const TAG_ISGN: FourCC = FourCC(*b"ISGN");
/// Input signature, minimum-precision variant.
pub const TAG_ISG1: FourCC = FourCC(*b"ISG1");
/// Output signature.
pub const TAG_OSGN: FourCC = FourCC(*b"OSGN");
/// Output signature, geometry-shader-with-streams variant.
pub const TAG_OSG5: FourCC = FourCC(*b"OSG5");
/// Output signature, minimum-precision variant.
pub const TAG_OSG1: FourCC = FourCC(*b"OSG1");
/// Patch-constant signature.
pub const TAG_PCSG: FourCC = FourCC(*b"PCSG");
/// Patch-constant signature, minimum-precision variant.
pub const TAG_PSG1: FourCC = FourCC(*b"PSG1");
/// Shader model 4.x token stream.
pub const TAG_SHDR: FourCC = FourCC(*b"SHDR");
/// Shader model 5.x token stream.
pub const TAG_SHEX: FourCC = FourCC(*b"SHEX");
/// Shader feature info flags.
pub const TAG_SFI0: FourCC = FourCC(*b"SFI0");
/// Shader statistics.
pub const TAG_STAT: FourCC = FourCC(*b"STAT");
