//! Codec for shader model 4/5 tokenized programs (the D3D10/D3D11 "TPF"
//! format).
//!
//! The crate decodes a raw dword token stream into a typed in-memory
//! program ([`ir::Program`]), validates it structurally, and re-encodes a
//! program back into the token stream plus the sibling container sections
//! (signatures, feature flags, statistics). Decoding and encoding are pure
//! functions of their inputs; the opcode lookup tables are built once and
//! shared read-only.
//!
//! ```no_run
//! # fn demo(tokens: &[u32], desc: opal_sm4::ShaderDesc) -> Result<(), opal_sm4::ShaderError> {
//! let (program, diagnostics) = opal_sm4::decode::parse_program(tokens, desc)?;
//! assert!(diagnostics.is_empty());
//! let encoded = opal_sm4::encode::encode_program(&program)?;
//! # let _ = encoded; Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod decode;
pub mod encode;
pub mod fourcc;
pub mod ir;
pub mod limits;
pub mod op;
pub mod stat;
/// Synthetic token-stream builders for tests. Compiled for this crate's own
/// tests and when the `test-utils` feature is enabled; **not** part of the
/// stable API.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod token;
pub mod validate;

pub use decode::DecodeError;
pub use encode::Section;
pub use ir::{Program, Signature, SignatureElement, Version};

use std::fmt;

/// Caller-facing error set for the decode/encode entry points.
///
/// Internal structural errors (with their dword positions) fold into
/// [`ShaderError::InvalidShader`] at the boundary; the structured form stays
/// available as [`DecodeError`] inside the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    /// Malformed header or buffer size, or an argument the entry point
    /// cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// An allocation for a size derived from the input failed.
    #[error("out of memory")]
    OutOfMemory,
    /// Structural or semantic violation detected during or after decode,
    /// or an internally inconsistent program handed to the encoder.
    #[error("invalid shader: {0}")]
    InvalidShader(String),
}

impl From<DecodeError> for ShaderError {
    fn from(e: DecodeError) -> Self {
        match e.kind {
            decode::DecodeErrorKind::OutOfMemory => Self::OutOfMemory,
            _ => Self::InvalidShader(e.to_string()),
        }
    }
}

/// Pre-parsed container inputs the decoder consumes read-only: the three
/// signature tables extracted from sibling sections by an external
/// container reader.
///
/// The "used" masks of the output signature (and, for hull shaders, the
/// patch-constant signature) are expected in their stored wire form; the
/// validator un-inverts them while building the program.
#[derive(Debug, Clone, Default)]
pub struct ShaderDesc {
    pub input_signature: Signature,
    pub output_signature: Signature,
    pub patch_constant_signature: Signature,
}

/// One recoverable anomaly noted during decode or encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dword position in the token stream the anomaly was seen at; zero for
    /// whole-program anomalies.
    pub at_dword: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at dword {}: {}", self.at_dword, self.message)
    }
}

/// Collected recoverable anomalies. Every entry is also logged through
/// `tracing::warn!` when it is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one anomaly.
    pub fn warn(&mut self, at_dword: usize, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(at_dword, "{message}");
        self.items.push(Diagnostic { at_dword, message });
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of recorded anomalies.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterates the recorded anomalies in order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Consumes the sink.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
