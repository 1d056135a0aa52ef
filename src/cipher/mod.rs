//! Cipher capability traits.
//!
//! Grounded on the teacher's `Cipher` trait (`src/traits.rs`): a small
//! interface of `generate_key`/`encrypt`/`decrypt`, not an inheritance
//! hierarchy, per the spec's own guidance to express cipher capability as
//! a tagged variant or small interface.

pub mod aes_cbc;
pub mod chacha20;

use crate::error::Result;
use crate::key::Key;

/// Whole-buffer cipher capability: `generate_key`, `encrypt`, `decrypt`.
///
/// `Send + Sync` so a selected cipher can be shared across the
/// pipeline's worker threads (large and very-large mode).
pub trait Cipher: Send + Sync {
    /// Generate a fresh key suitable for this cipher.
    #[must_use]
    fn generate_key(&self) -> Key;

    /// Encrypt `plaintext` with `key`.
    ///
    /// # Errors
    ///
    /// Errors if encryption fails.
    fn encrypt(&self, plaintext: &[u8], key: &Key) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` with `key`.
    ///
    /// # Errors
    ///
    /// Errors if decryption fails, e.g. the ciphertext is malformed.
    fn decrypt(&self, ciphertext: &[u8], key: &Key) -> Result<Vec<u8>>;

    /// Maximum number of extra bytes this cipher's output can exceed its
    /// input by, for a single whole-buffer invocation (e.g. padding to a
    /// block boundary, plus any per-call nonce/IV). Zero for pure stream
    /// ciphers.
    ///
    /// Used by very-large mode to size per-segment ciphertext strides.
    #[must_use]
    fn segment_overhead(&self) -> usize;

    /// The padding scheme this cipher applies, for padding reconciliation.
    #[must_use]
    fn padding_scheme(&self) -> crate::padding::PaddingScheme;
}

/// Stream-cipher capability required for large mode: `|cipher(c)| =
/// |c|` must hold, so output offsets can be computed directly from input
/// chunk offsets.
pub trait StreamingCipher: Cipher {
    /// Length in bytes of the nonce this cipher consumes.
    #[must_use]
    fn nonce_len(&self) -> usize;

    /// Generate a fresh random nonce.
    #[must_use]
    fn generate_nonce(&self) -> Vec<u8>;

    /// XOR `buf` in place with the keystream for the block starting at
    /// `block_offset` (a byte offset into the logical stream, a multiple
    /// of the cipher's block size).
    ///
    /// # Errors
    ///
    /// Errors if `key` or `nonce` are malformed.
    fn apply_keystream(&self, key: &Key, nonce: &[u8], block_offset: u64, buf: &mut [u8]) -> Result<()>;
}
