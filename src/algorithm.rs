//! Algorithm identity and extension mapping.
//!
//! A bidirectional map between the 4-character container tag, a
//! human-readable display name, and a file suffix, plus the [`CipherKind`]
//! value-typed dispatch enum used by the pipeline.
//!
//! The container format reserves eight tags (`AESG`, `CC20`, `SL20`,
//! `3DES`, `3FSH`, `RC2_`, `XCCH`, `AES_`) so containers produced by other
//! algorithm revisions stay identifiable. Only `CC20` (ChaCha20) and
//! `AES_` (AES-256-CBC) have working [`Cipher`](crate::cipher::Cipher)
//! implementations here; the rest are registry entries only, matching the
//! spec's framing of cipher primitives as external collaborators beyond
//! their `encrypt`/`decrypt` contract.

use crate::cipher::aes_cbc::AesCbcCipher;
use crate::cipher::chacha20::ChaCha20Cipher;
use crate::cipher::{Cipher, StreamingCipher};
use crate::header::Tag;

struct Entry {
    tag: &'static str,
    name: &'static str,
    extension: &'static str,
}

const REGISTRY: &[Entry] = &[
    Entry { tag: "AESG", name: "AES-256-GCM", extension: "aesg" },
    Entry { tag: "CC20", name: "ChaCha20", extension: "cc20" },
    Entry { tag: "SL20", name: "Salsa20", extension: "sl20" },
    Entry { tag: "3DES", name: "Triple DES", extension: "3des" },
    Entry { tag: "3FSH", name: "Threefish", extension: "3fsh" },
    Entry { tag: "RC2_", name: "RC2", extension: "rc2" },
    Entry { tag: "XCCH", name: "XChaCha20", extension: "xcch" },
    Entry { tag: "AES_", name: "AES-256-CBC", extension: "aes" },
];

/// Look up the display name for a tag. Falls back to the tag itself
/// (trimmed of padding) when no mapping exists.
#[must_use]
pub fn display_name(tag: &str) -> String {
    REGISTRY
        .iter()
        .find(|e| e.tag == tag)
        .map_or_else(|| tag.trim_end_matches('_').to_string(), |e| e.name.to_string())
}

/// Look up the file suffix associated with a tag.
#[must_use]
pub fn extension_for_tag(tag: &str) -> Option<&'static str> {
    REGISTRY.iter().find(|e| e.tag == tag).map(|e| e.extension)
}

/// Reverse lookup: map a file extension back to its tag.
#[must_use]
pub fn tag_for_extension(extension: &str) -> Option<Tag> {
    REGISTRY
        .iter()
        .find(|e| e.extension.eq_ignore_ascii_case(extension))
        .map(|e| crate::header::pad_tag(e.tag))
}

/// Value-typed dispatch over the ciphers this crate actually implements.
///
/// Per the spec's own Design Notes, backend/cipher dispatch is a value
/// enum selected once, never a `dyn Trait` invoked per block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CipherKind {
    ChaCha20,
    AesCbc,
}

impl CipherKind {
    #[must_use]
    pub fn tag(self) -> Tag {
        crate::header::pad_tag(self.tag_str())
    }

    #[must_use]
    pub fn tag_str(self) -> &'static str {
        match self {
            Self::ChaCha20 => "CC20",
            Self::AesCbc => "AES_",
        }
    }

    #[must_use]
    pub fn from_tag(tag: &Tag) -> Option<Self> {
        match tag {
            b"CC20" => Some(Self::ChaCha20),
            b"AES_" => Some(Self::AesCbc),
            _ => None,
        }
    }

    /// Parse a CLI-style algorithm name: either the registered file
    /// extension (`cc20`, `aes`) or the 4-character container tag
    /// (`CC20`, `AES_`), case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(tag) = tag_for_extension(name) {
            return Self::from_tag(&tag);
        }
        let padded = crate::header::pad_tag(&name.to_ascii_uppercase());
        Self::from_tag(&padded)
    }

    /// Whether this cipher supports large mode (requires
    /// `|cipher(c)| = |c|`, i.e. a true stream cipher).
    #[must_use]
    pub fn is_streaming(self) -> bool {
        matches!(self, Self::ChaCha20)
    }

    #[must_use]
    pub fn as_cipher(self) -> Box<dyn Cipher> {
        match self {
            Self::ChaCha20 => Box::new(ChaCha20Cipher::new()),
            Self::AesCbc => Box::new(AesCbcCipher::new()),
        }
    }

    #[must_use]
    pub fn as_streaming_cipher(self) -> Option<Box<dyn StreamingCipher>> {
        match self {
            Self::ChaCha20 => Some(Box::new(ChaCha20Cipher::new())),
            Self::AesCbc => None,
        }
    }
}
