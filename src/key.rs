//! Key loading, size normalization, and persistence.

use std::fs;
use std::path::Path;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use secrecy::{ExposeSecret, SecretSlice};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Normalized key length in bytes.
pub const KEY_SIZE: usize = 32;

/// A normalized, exactly-32-byte symmetric key.
///
/// Wraps [`SecretSlice`] so the bytes are zeroized on drop, matching the
/// teacher's `GeneratedKey::Symmetric` handling.
#[derive(Clone)]
pub struct Key(SecretSlice<u8>);

impl Key {
    /// Wrap already-normalized bytes. Use [`Key::validate`] unless the
    /// caller has already guaranteed the length.
    #[must_use]
    pub fn from_normalized(bytes: [u8; KEY_SIZE]) -> Self {
        Self(SecretSlice::from(bytes.to_vec()))
    }

    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }

    /// Normalize arbitrary bytes to a 32-byte key per the size validation
    /// rules.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::InvalidKey`] if `bytes` is empty.
    pub fn validate(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidKey);
        }

        let normalized = match bytes.len().cmp(&KEY_SIZE) {
            std::cmp::Ordering::Equal => bytes.to_vec(),
            std::cmp::Ordering::Less => {
                let mut out = vec![0u8; KEY_SIZE];
                out[..bytes.len()].copy_from_slice(bytes);
                for (i, slot) in out.iter_mut().enumerate().skip(bytes.len()) {
                    *slot = bytes[i % bytes.len()] ^ 0x5C;
                }
                out
            }
            std::cmp::Ordering::Greater => {
                let mut hasher = Sha256::new();
                hasher.update(bytes);
                hasher.finalize().to_vec()
            }
        };

        Ok(Self(SecretSlice::from(normalized)))
    }

    /// Load and normalize a key from a file, sniffing hex, then Base64,
    /// then raw bytes.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::IOFailure`] if the file cannot be read, or
    /// [`Error::InvalidKey`] if the decoded bytes are empty.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read(path)?;

        if let Ok(text) = std::str::from_utf8(&contents) {
            let trimmed = text.trim();

            if let Some(bytes) = decode_hex(trimmed) {
                return Self::validate(&bytes);
            }

            if let Ok(bytes) = BASE64_STANDARD.decode(trimmed) {
                return Self::validate(&bytes);
            }
        }

        Self::validate(&contents)
    }

    /// Persist the key as uppercase hex, no separators.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::IOFailure`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let hex = hex::encode_upper(self.expose());
        fs::write(path, hex)?;
        Ok(())
    }
}

/// Decode a hex string per the loader's sniffing rule: non-empty, every
/// character a hex digit, odd length gets a leading `0`.
fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let padded = if text.len() % 2 == 1 {
        format!("0{text}")
    } else {
        text.to_string()
    };

    hex::decode(padded).ok()
}
