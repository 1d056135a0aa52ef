//! ChaCha20 stream cipher: RFC 8439 core state/round (spec §4.2),
//! runtime SIMD backend selection (spec §4.1), the keystream generator
//! (spec §4.3), and the [`Cipher`]/[`StreamingCipher`] adapters used by
//! the pipeline.

pub mod backend;
pub mod scalar;
pub mod simd128;
pub mod simd256;

use rand::RngCore;

use crate::cipher::{Cipher, StreamingCipher};
use crate::error::{Error, Result};
use crate::key::{KEY_SIZE, Key};
use crate::padding::PaddingScheme;

/// Nonce length this cipher consumes, per RFC 8439.
pub const NONCE_SIZE: usize = 12;

const BLOCK_SIZE: usize = 64;

/// Lazy ChaCha20 keystream generator (spec §4.3).
///
/// Produces keystream bytes on demand; the counter word is updated as
/// blocks are produced so successive [`KeyStream::fill`] calls resume
/// correctly. Processes pairs of blocks through the 256-bit backend
/// while at least two full blocks remain, then completes the tail
/// (including any strictly-partial final block) through the 128-bit
/// single-block routine.
pub struct KeyStream {
    key: [u8; KEY_SIZE],
    nonce: [u8; NONCE_SIZE],
    counter: u32,
}

impl KeyStream {
    #[must_use]
    pub fn new(key: [u8; KEY_SIZE], nonce: [u8; NONCE_SIZE], counter: u32) -> Self {
        Self { key, nonce, counter }
    }

    /// The next block index this generator will produce.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Fill `out` with the next `out.len()` keystream bytes.
    pub fn fill(&mut self, out: &mut [u8]) {
        let chosen = backend::selected();
        let mut offset = 0;

        if chosen == backend::Backend::Simd256 {
            while out.len() - offset >= 2 * BLOCK_SIZE {
                let s0 = scalar::initial_state(&self.key, &self.nonce, self.counter);
                let s1 = scalar::initial_state(&self.key, &self.nonce, self.counter.wrapping_add(1));

                #[cfg(target_arch = "x86_64")]
                let (b0, b1) = unsafe { simd256::dual_block(&s0, &s1) };
                #[cfg(not(target_arch = "x86_64"))]
                let (b0, b1) = (scalar::block(&s0), scalar::block(&s1));

                out[offset..offset + BLOCK_SIZE].copy_from_slice(&b0);
                out[offset + BLOCK_SIZE..offset + 2 * BLOCK_SIZE].copy_from_slice(&b1);
                self.counter = self.counter.wrapping_add(2);
                offset += 2 * BLOCK_SIZE;
            }
        }

        while out.len() - offset >= BLOCK_SIZE {
            let state = scalar::initial_state(&self.key, &self.nonce, self.counter);
            let block = Self::single_block(chosen, &state);
            out[offset..offset + BLOCK_SIZE].copy_from_slice(&block);
            self.counter = self.counter.wrapping_add(1);
            offset += BLOCK_SIZE;
        }

        let remaining = out.len() - offset;
        if remaining > 0 {
            let state = scalar::initial_state(&self.key, &self.nonce, self.counter);
            let block = Self::single_block(chosen, &state);
            out[offset..].copy_from_slice(&block[..remaining]);
            self.counter = self.counter.wrapping_add(1);
        }
    }

    /// A single block, via the 128-bit backend when available (the
    /// 256-bit backend's own single-block fallback), otherwise scalar.
    fn single_block(chosen: backend::Backend, state: &[u32; 16]) -> [u8; 64] {
        match chosen {
            backend::Backend::Scalar => scalar::block(state),
            backend::Backend::Simd128 | backend::Backend::Simd256 => {
                #[cfg(target_arch = "x86_64")]
                {
                    unsafe { simd128::block(state) }
                }
                #[cfg(not(target_arch = "x86_64"))]
                {
                    scalar::block(state)
                }
            }
        }
    }

    /// XOR `buf` in place with keystream bytes, advancing the counter.
    pub fn apply(&mut self, buf: &mut [u8]) {
        let mut keystream = vec![0u8; buf.len()];
        self.fill(&mut keystream);
        for (byte, ks) in buf.iter_mut().zip(keystream.iter()) {
            *byte ^= ks;
        }
    }
}

pub struct ChaCha20Cipher;

impl ChaCha20Cipher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn key_bytes(key: &Key) -> Result<[u8; KEY_SIZE]> {
        key.expose()
            .try_into()
            .map_err(|_| Error::Internal("chacha20 key must be normalized to 32 bytes".to_string()))
    }
}

impl Default for ChaCha20Cipher {
    fn default() -> Self {
        Self::new()
    }
}

impl Cipher for ChaCha20Cipher {
    fn generate_key(&self) -> Key {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Key::from_normalized(bytes)
    }

    fn encrypt(&self, plaintext: &[u8], key: &Key) -> Result<Vec<u8>> {
        let key_bytes = Self::key_bytes(key)?;
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce);

        let mut body = plaintext.to_vec();
        KeyStream::new(key_bytes, nonce, 0).apply(&mut body);

        let mut out = Vec::with_capacity(NONCE_SIZE + body.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &Key) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_SIZE {
            return Err(Error::CipherFailure(
                "ciphertext shorter than a chacha20 nonce".to_string(),
            ));
        }
        let key_bytes = Self::key_bytes(key)?;
        let (nonce, body) = ciphertext.split_at(NONCE_SIZE);
        let nonce: [u8; NONCE_SIZE] = nonce.try_into().expect("split_at guarantees length");

        let mut plaintext = body.to_vec();
        KeyStream::new(key_bytes, nonce, 0).apply(&mut plaintext);
        Ok(plaintext)
    }

    fn segment_overhead(&self) -> usize {
        NONCE_SIZE
    }

    fn padding_scheme(&self) -> PaddingScheme {
        PaddingScheme::None
    }
}

impl StreamingCipher for ChaCha20Cipher {
    fn nonce_len(&self) -> usize {
        NONCE_SIZE
    }

    fn generate_nonce(&self) -> Vec<u8> {
        let mut nonce = vec![0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce);
        nonce
    }

    fn apply_keystream(&self, key: &Key, nonce: &[u8], block_offset: u64, buf: &mut [u8]) -> Result<()> {
        let key_bytes = Self::key_bytes(key)?;
        let nonce: [u8; NONCE_SIZE] = nonce
            .try_into()
            .map_err(|_| Error::Internal("chacha20 nonce must be 12 bytes".to_string()))?;

        if block_offset % BLOCK_SIZE as u64 != 0 {
            return Err(Error::Internal(
                "chacha20 block_offset must be a multiple of the block size".to_string(),
            ));
        }
        let counter = u32::try_from(block_offset / BLOCK_SIZE as u64)
            .map_err(|_| Error::Internal("chacha20 counter overflow".to_string()))?;

        KeyStream::new(key_bytes, nonce, counter).apply(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let cipher = ChaCha20Cipher::new();
        let key = cipher.generate_key();
        let plaintext = b"the quick brown fox jumps over the lazy dog".to_vec();

        let ciphertext = cipher.encrypt(&plaintext, &key).unwrap();
        assert_eq!(ciphertext.len(), NONCE_SIZE + plaintext.len());

        let decrypted = cipher.decrypt(&ciphertext, &key).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let cipher = ChaCha20Cipher::new();
        let key = cipher.generate_key();
        let ciphertext = cipher.encrypt(&[], &key).unwrap();
        assert_eq!(ciphertext.len(), NONCE_SIZE);
        assert_eq!(cipher.decrypt(&ciphertext, &key).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn apply_keystream_matches_whole_buffer_encrypt() {
        let cipher = ChaCha20Cipher::new();
        let key = cipher.generate_key();
        let nonce = cipher.generate_nonce();

        let plaintext = vec![0x42u8; 300];
        let mut via_stream = plaintext.clone();
        cipher
            .apply_keystream(&key, &nonce, 0, &mut via_stream)
            .unwrap();

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(key.expose());
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(&nonce);
        let mut via_keystream = plaintext.clone();
        KeyStream::new(key_bytes, nonce_bytes, 0).apply(&mut via_keystream);

        assert_eq!(via_stream, via_keystream);
    }

    #[test]
    fn apply_keystream_resumes_at_block_offset() {
        let cipher = ChaCha20Cipher::new();
        let key = cipher.generate_key();
        let nonce = cipher.generate_nonce();

        // Generate 200 bytes in one call, then the same 200 bytes split
        // across two calls at a block-aligned offset; both must match.
        let mut whole = vec![0u8; 200];
        cipher.apply_keystream(&key, &nonce, 0, &mut whole).unwrap();

        let mut first = vec![0u8; 128];
        cipher.apply_keystream(&key, &nonce, 0, &mut first).unwrap();
        let mut second = vec![0u8; 72];
        cipher.apply_keystream(&key, &nonce, 128, &mut second).unwrap();

        let mut rejoined = first;
        rejoined.extend(second);
        assert_eq!(rejoined, whole);
    }

    #[test]
    fn counter_progresses_by_ceil_blocks() {
        let mut stream = KeyStream::new([0u8; KEY_SIZE], [0u8; NONCE_SIZE], 5);
        let mut buf = vec![0u8; 65]; // just over one block
        stream.fill(&mut buf);
        assert_eq!(stream.counter(), 5 + 2);
    }
}
