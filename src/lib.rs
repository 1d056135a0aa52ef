pub mod algorithm;
pub mod cipher;
pub mod config;
pub mod detect;
pub mod error;
pub mod header;
pub mod key;
pub mod padding;
pub mod pipeline;

pub use algorithm::CipherKind;
pub use error::{Error, Result};
pub use key::Key;
pub use pipeline::{CancellationToken, decrypt_file, decrypt_file_ok, encrypt_file, encrypted_path_for};
