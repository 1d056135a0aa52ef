//! Large mode (spec §4.4): streaming input, bounded-parallel chunked
//! cipher application against a random-access output file.
//!
//! Restricted to [`StreamingCipher`]s — ciphers where `|cipher(c)| =
//! |c|` — per the resolved Open Question #1 (spec §9): chunk output
//! offsets are computed directly from input chunk offsets, which only
//! holds for true stream ciphers. A padded block cipher is rejected
//! with a [`Error::CipherFailure`] before any work begins.
//!
//! Grounded on the teacher's `pipeline::cipher::chacha` read-chunk /
//! transform / write-chunk loop, generalized from its single-threaded
//! AEAD stream framing to the spec's bounded worker pool
//! (`std::thread::scope` + `std::sync::mpsc`, matching the teacher's
//! synchronous-only style).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::mpsc;

use tracing::warn;

use crate::algorithm::CipherKind;
use crate::cipher::StreamingCipher;
use crate::config::{self, Config, Mode};
use crate::error::{Error, Result};
use crate::header::{HEADER_SIZE, Header};
use crate::key::Key;

use super::CancellationToken;

struct Task {
    output_offset: u64,
    bytes: Vec<u8>,
}

fn streaming_cipher(cipher_kind: CipherKind) -> Result<Box<dyn StreamingCipher>> {
    cipher_kind.as_streaming_cipher().ok_or_else(|| {
        Error::CipherFailure(format!(
            "{} does not support large mode (requires |cipher(c)| = |c|)",
            cipher_kind.tag_str()
        ))
    })
}

pub fn encrypt(
    input_path: &Path,
    output_path: &Path,
    cipher_kind: CipherKind,
    config: &Config,
    key: &Key,
    token: &CancellationToken,
) -> Result<()> {
    let cipher = streaming_cipher(cipher_kind)?;

    let mut input = File::open(input_path)?;
    let mut output = OpenOptions::new().write(true).create(true).truncate(true).open(output_path)?;

    let header = Header::new(cipher_kind.tag(), Mode::Large.to_tag());
    output.write_all(&header.to_byte_array())?;

    let nonce = cipher.generate_nonce();
    output.write_all(&nonce)?;

    let output_offset_base = HEADER_SIZE as u64 + nonce.len() as u64;
    let file_size = input.metadata()?.len();
    let chunk_size = config::chunk_size_for(file_size);

    run_chunks(
        &mut input,
        &mut output,
        &*cipher,
        key,
        &nonce,
        output_offset_base,
        chunk_size,
        config.max_parallelism,
        token,
    )
}

pub fn decrypt(
    input_path: &Path,
    output_path: &Path,
    cipher_kind: CipherKind,
    config: &Config,
    key: &Key,
    token: &CancellationToken,
) -> Result<()> {
    let cipher = streaming_cipher(cipher_kind)?;

    let mut input = File::open(input_path)?;
    let mut output = OpenOptions::new().write(true).create(true).truncate(true).open(output_path)?;

    let nonce_len = cipher.nonce_len();
    let mut nonce = vec![0u8; nonce_len];

    match Header::read(&mut input) {
        Ok(_) => {
            input.read_exact(&mut nonce)?;
        }
        Err(_) => {
            warn!(
                path = %input_path.display(),
                "large mode: invalid container header, falling back to legacy headerless decrypt"
            );
            input.seek(SeekFrom::Start(0))?;
            input.read_exact(&mut nonce)?;
        }
    }

    let file_size = input.metadata()?.len();
    let chunk_size = config::chunk_size_for(file_size);

    run_chunks(&mut input, &mut output, &*cipher, key, &nonce, 0, chunk_size, config.max_parallelism, token)
}

fn read_up_to(input: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[allow(clippy::too_many_arguments)]
fn run_chunks(
    input: &mut File,
    output: &mut File,
    cipher: &dyn StreamingCipher,
    key: &Key,
    nonce: &[u8],
    output_offset_base: u64,
    chunk_size: usize,
    max_parallelism: usize,
    token: &CancellationToken,
) -> Result<()> {
    let max_parallelism = max_parallelism.max(1);
    let mut stream_offset: u64 = 0;
    let mut in_flight = 0usize;
    let mut eof = false;

    std::thread::scope(|scope| -> Result<()> {
        let (tx, rx) = mpsc::channel::<Result<Task>>();

        loop {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }

            while !eof && in_flight < max_parallelism {
                let mut buf = vec![0u8; chunk_size];
                let n = read_up_to(input, &mut buf)?;
                if n == 0 {
                    eof = true;
                    break;
                }
                buf.truncate(n);

                let chunk_offset = stream_offset;
                stream_offset += n as u64;

                let tx = tx.clone();
                let key = key.clone();
                let nonce = nonce.to_vec();
                scope.spawn(move || {
                    let mut buf = buf;
                    let result = cipher.apply_keystream(&key, &nonce, chunk_offset, &mut buf).map(|()| Task {
                        output_offset: output_offset_base + chunk_offset,
                        bytes: buf,
                    });
                    let _ = tx.send(result);
                });
                in_flight += 1;
            }

            if in_flight == 0 {
                break;
            }

            let task = rx
                .recv()
                .map_err(|_| Error::Internal("large mode worker channel closed unexpectedly".to_string()))??;
            in_flight -= 1;

            output.seek(SeekFrom::Start(task.output_offset))?;
            output.write_all(&task.bytes)?;
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::Cipher;
    use crate::cipher::chacha20::ChaCha20Cipher;

    fn tiny_config(max_parallelism: usize) -> Config {
        Config {
            max_parallelism,
            ..Config::detect()
        }
    }

    #[test]
    fn round_trip_across_chunk_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.bin");
        let encrypted_path = dir.path().join("out.veil");
        let decrypted_path = dir.path().join("out.bin");

        // Several times the (unconfigurable-here) default chunk size
        // table's smallest entry, exercised with a deliberately tiny
        // chunk size via a direct `run_chunks` equivalent: reuse the
        // public encrypt/decrypt entry points instead, which derive
        // chunk size from file size; a few hundred KiB is enough to
        // span multiple 256 KiB chunks.
        let plaintext = vec![0xABu8; 600 * 1024];
        std::fs::write(&input_path, &plaintext).unwrap();

        let cipher = ChaCha20Cipher::new();
        let key = cipher.generate_key();
        let token = CancellationToken::new();
        let config = tiny_config(3);

        encrypt(&input_path, &encrypted_path, CipherKind::ChaCha20, &config, &key, &token).unwrap();
        decrypt(&encrypted_path, &decrypted_path, CipherKind::ChaCha20, &config, &key, &token).unwrap();

        assert_eq!(std::fs::read(&decrypted_path).unwrap(), plaintext);
    }

    #[test]
    fn rejects_non_streaming_cipher() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.bin");
        std::fs::write(&input_path, b"hello").unwrap();

        let cipher = CipherKind::AesCbc.as_cipher();
        let key = cipher.generate_key();
        let token = CancellationToken::new();
        let config = tiny_config(2);

        let err = encrypt(
            &input_path,
            &dir.path().join("out.veil"),
            CipherKind::AesCbc,
            &config,
            &key,
            &token,
        )
        .unwrap_err();
        assert!(matches!(err, Error::CipherFailure(_)));
    }

    #[test]
    fn legacy_headerless_decrypt_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("legacy.bin");
        let decrypted_path = dir.path().join("out.bin");

        let cipher = ChaCha20Cipher::new();
        let key = cipher.generate_key();
        let nonce = cipher.generate_nonce();

        let plaintext = b"legacy headerless payload, no container prefix".to_vec();
        let mut body = plaintext.clone();
        cipher.apply_keystream(&key, &nonce, 0, &mut body).unwrap();

        let mut raw = nonce.clone();
        raw.extend_from_slice(&body);
        std::fs::write(&raw_path, &raw).unwrap();

        let token = CancellationToken::new();
        let config = tiny_config(2);
        decrypt(&raw_path, &decrypted_path, CipherKind::ChaCha20, &config, &key, &token).unwrap();

        assert_eq!(std::fs::read(&decrypted_path).unwrap(), plaintext);
    }
}
