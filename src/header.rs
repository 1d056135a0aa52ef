//! The fixed-size container header.
//!
//! Grounded on the teacher's own `CH20` + version-byte prefix
//! (`pipeline/cipher/chacha.rs`), extended with a zero-padded reserved
//! region so the header is a compile-time constant size regardless of
//! future fields.
//!
//! The reserved region's first byte carries the processing [`mode
//! tag`](crate::config::Mode::to_tag) the file was encrypted with.
//! Container size alone cannot tell decryption which mode encryption
//! used (the container is always larger than the plaintext it holds,
//! so the two don't cross the small/large/very-large thresholds at the
//! same point), so the orchestrator reads this field back instead of
//! re-deriving a mode from the ciphertext's length.

use std::io::Read;

use crate::error::{Error, Result};

/// Magic bytes identifying a container produced by this crate.
pub const MAGIC: [u8; 4] = *b"VEIL";

/// Current container format version.
pub const VERSION: u8 = 1;

/// Fixed on-disk header size, in bytes.
pub const HEADER_SIZE: usize = 16;

/// 4-byte ASCII algorithm tag, right-padded with `_` when the logical name
/// is shorter than 4 characters.
pub type Tag = [u8; 4];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    pub tag: Tag,
    /// The processing mode this container was encrypted under (see
    /// [`crate::config::Mode::to_tag`]/[`crate::config::Mode::from_tag`]).
    pub mode_tag: u8,
}

impl Header {
    #[must_use]
    pub fn new(tag: Tag, mode_tag: u8) -> Self {
        Self { tag, mode_tag }
    }

    /// Emit `magic || version || algorithm_tag || mode_tag ||
    /// padding_to_HEADER_SIZE`.
    #[must_use]
    pub fn to_byte_array(self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC);
        out[4] = VERSION;
        out[5..9].copy_from_slice(&self.tag);
        out[9] = self.mode_tag;
        // out[10..HEADER_SIZE] stays zero-filled reserved space.
        out
    }

    /// Read and verify a header from `reader`.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::InvalidContainer`] if fewer than `HEADER_SIZE`
    /// bytes are available, or if the magic or version do not match.
    pub fn read(reader: &mut dyn Read) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut buf)
            .map_err(|_| Error::InvalidContainer)?;
        Self::parse(&buf)
    }

    /// Parse a header from an in-memory buffer of at least `HEADER_SIZE`
    /// bytes.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::InvalidContainer`] if the buffer is too short,
    /// or if the magic or version do not match.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::InvalidContainer);
        }
        if buf[0..4] != MAGIC || buf[4] != VERSION {
            return Err(Error::InvalidContainer);
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&buf[5..9]);
        Ok(Self { tag, mode_tag: buf[9] })
    }
}

/// Pad a logical algorithm name to a 4-byte ASCII tag with trailing `_`.
#[must_use]
pub fn pad_tag(name: &str) -> Tag {
    let mut tag = [b'_'; 4];
    for (slot, byte) in tag.iter_mut().zip(name.as_bytes().iter().take(4)) {
        *slot = *byte;
    }
    tag
}
