//! Small mode (spec §4.4): whole-buffer read, a single cipher call, no
//! parallelism. Used for inputs at or below
//! [`crate::config::LARGE_FILE_THRESHOLD`].

use std::fs;
use std::path::Path;

use crate::algorithm::CipherKind;
use crate::cipher::Cipher;
use crate::config::Mode;
use crate::error::{Error, Result};
use crate::header::{HEADER_SIZE, Header};
use crate::key::Key;

use super::CancellationToken;

pub fn encrypt(
    input_path: &Path,
    output_path: &Path,
    cipher_kind: CipherKind,
    cipher: &dyn Cipher,
    key: &Key,
    token: &CancellationToken,
) -> Result<()> {
    let plaintext = fs::read(input_path)?;
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let ciphertext = cipher.encrypt(&plaintext, key)?;
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let header = Header::new(cipher_kind.tag(), Mode::Small.to_tag());
    let mut out = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    out.extend_from_slice(&header.to_byte_array());
    out.extend_from_slice(&ciphertext);

    fs::write(output_path, out)?;
    Ok(())
}

pub fn decrypt(
    input_path: &Path,
    output_path: &Path,
    cipher: &dyn Cipher,
    key: &Key,
    token: &CancellationToken,
) -> Result<()> {
    let contents = fs::read(input_path)?;
    if contents.len() < HEADER_SIZE {
        return Err(Error::InvalidContainer);
    }
    Header::parse(&contents)?;
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let plaintext = cipher.decrypt(&contents[HEADER_SIZE..], key)?;
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    fs::write(output_path, plaintext)?;
    Ok(())
}
