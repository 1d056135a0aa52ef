//! AES-256-CBC with PKCS#7 padding (tag `AES_`).
//!
//! The only padded block cipher registered in this crate (spec §4.6's
//! `AES_` supplement), used to exercise padding reconciliation
//! end-to-end. Built directly on the `aes` crate's block primitive
//! (`Aes256` + `BlockEncrypt`/`BlockDecrypt`/`KeyInit`) chained into CBC
//! mode by hand, since no AEAD or chaining-mode wrapper is in scope here;
//! `block-padding`'s `Pkcs7` provides the pad/unpad byte logic, matching
//! `hambosto-sweetbyte-rs`'s manifest which pairs `aes`-family crates
//! with `block-padding` for exactly this purpose.
//!
//! Not a [`crate::cipher::StreamingCipher`]: `|cipher(c)| != |c|` in
//! general (IV prefix plus padding to the next 16-byte boundary), so
//! this cipher is unsupported in large mode per spec §4.4/§9.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use block_padding::{Pkcs7, RawPadding};
use rand::RngCore;

use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::key::{KEY_SIZE, Key};
use crate::padding::PaddingScheme;

const BLOCK_SIZE: usize = 16;
const IV_SIZE: usize = 16;

pub struct AesCbcCipher;

impl AesCbcCipher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn key_bytes(key: &Key) -> Result<[u8; KEY_SIZE]> {
        key.expose()
            .try_into()
            .map_err(|_| Error::Internal("aes-256 key must be normalized to 32 bytes".to_string()))
    }
}

impl Default for AesCbcCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl Cipher for AesCbcCipher {
    fn generate_key(&self) -> Key {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Key::from_normalized(bytes)
    }

    fn encrypt(&self, plaintext: &[u8], key: &Key) -> Result<Vec<u8>> {
        let key_bytes = Self::key_bytes(key)?;
        let cipher = Aes256::new(GenericArray::from_slice(&key_bytes));

        let mut iv = [0u8; IV_SIZE];
        rand::rng().fill_bytes(&mut iv);

        let pos = plaintext.len() % BLOCK_SIZE;
        let pad_len = BLOCK_SIZE - pos;
        let mut buf = plaintext.to_vec();
        buf.resize(buf.len() + pad_len, 0);
        let last_block_start = buf.len() - BLOCK_SIZE;
        Pkcs7::raw_pad(&mut buf[last_block_start..], pos);

        let mut prev = iv;
        for block in buf.chunks_mut(BLOCK_SIZE) {
            for (byte, p) in block.iter_mut().zip(prev.iter()) {
                *byte ^= p;
            }
            let array = GenericArray::from_mut_slice(block);
            cipher.encrypt_block(array);
            prev.copy_from_slice(block);
        }

        let mut out = Vec::with_capacity(IV_SIZE + buf.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&buf);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &Key) -> Result<Vec<u8>> {
        if ciphertext.len() < IV_SIZE || (ciphertext.len() - IV_SIZE) % BLOCK_SIZE != 0 {
            return Err(Error::CipherFailure(
                "aes-256-cbc ciphertext is not iv-prefixed block-aligned data".to_string(),
            ));
        }
        let key_bytes = Self::key_bytes(key)?;
        let cipher = Aes256::new(GenericArray::from_slice(&key_bytes));

        let (iv, body) = ciphertext.split_at(IV_SIZE);
        let mut prev: [u8; IV_SIZE] = iv.try_into().expect("split_at guarantees length");

        let mut plaintext = Vec::with_capacity(body.len());
        for block in body.chunks(BLOCK_SIZE) {
            let mut decrypted = [0u8; BLOCK_SIZE];
            decrypted.copy_from_slice(block);
            let array = GenericArray::from_mut_slice(&mut decrypted);
            cipher.decrypt_block(array);
            for (byte, p) in decrypted.iter_mut().zip(prev.iter()) {
                *byte ^= p;
            }
            plaintext.extend_from_slice(&decrypted);
            prev.copy_from_slice(block);
        }

        if let Some(last_block) = plaintext.len().checked_sub(BLOCK_SIZE) {
            let unpadded_len = Pkcs7::raw_unpad(&plaintext[last_block..])
                .map_err(|_| Error::CipherFailure("invalid pkcs7 padding".to_string()))?
                .len();
            plaintext.truncate(last_block + unpadded_len);
        }

        Ok(plaintext)
    }

    fn segment_overhead(&self) -> usize {
        IV_SIZE + BLOCK_SIZE
    }

    fn padding_scheme(&self) -> PaddingScheme {
        PaddingScheme::Pkcs7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_arbitrary_lengths() {
        let cipher = AesCbcCipher::new();
        let key = cipher.generate_key();

        for len in [0, 1, 15, 16, 17, 31, 32, 100] {
            let plaintext = vec![0xABu8; len];
            let ciphertext = cipher.encrypt(&plaintext, &key).unwrap();
            assert_eq!(ciphertext.len() % BLOCK_SIZE, IV_SIZE % BLOCK_SIZE);
            let decrypted = cipher.decrypt(&ciphertext, &key).unwrap();
            assert_eq!(decrypted, plaintext, "length {len}");
        }
    }

    #[test]
    fn ciphertext_always_grows_by_iv_plus_padding() {
        let cipher = AesCbcCipher::new();
        let key = cipher.generate_key();
        let plaintext = vec![1u8; 16]; // exact multiple: full block of padding added
        let ciphertext = cipher.encrypt(&plaintext, &key).unwrap();
        assert_eq!(ciphertext.len(), IV_SIZE + 32);
    }

    #[test]
    fn rejects_truncated_ciphertext() {
        let cipher = AesCbcCipher::new();
        let key = cipher.generate_key();
        assert!(cipher.decrypt(&[0u8; 10], &key).is_err());
    }
}
