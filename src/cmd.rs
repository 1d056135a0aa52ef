//! Subcommand implementations: thin CLI glue around the library's
//! caller-facing operations (spec §6), in the manner of the teacher's
//! own `cmd.rs` (one function per [`cli::Command`] variant, returning a
//! process exit code on failure).

pub mod cli;
mod ui;

use std::path::{Path, PathBuf};

use veilfile::{CancellationToken, CipherKind, Key, algorithm, decrypt_file, detect, encrypt_file, encrypted_path_for};

use cli::Args;
use ui::color::Color;

fn resolve_algorithm(args: &Args) -> Result<CipherKind, i32> {
    match args.algorithm.as_deref() {
        Some(name) => CipherKind::from_name(name).ok_or_else(|| {
            eprintln!("fatal: {}", Color::error(&format!("unknown algorithm '{name}'")));
            2
        }),
        None => Ok(CipherKind::ChaCha20),
    }
}

fn required_input(args: &Args) -> Result<&Path, i32> {
    args.input.as_deref().map(Path::new).ok_or_else(|| {
        eprintln!("fatal: {}", Color::error("missing input file"));
        2
    })
}

pub fn genkey(args: &Args) -> Result<(), i32> {
    let cipher_kind = resolve_algorithm(args)?;
    let key = cipher_kind.as_cipher().generate_key();

    match args.key_output.as_deref() {
        Some(path) => {
            key.save(Path::new(path)).map_err(|err| {
                eprintln!("fatal: {}", Color::error(&err.to_string()));
                1
            })?;
            println!("key written to {path}");
        }
        None => println!("{}", hex::encode_upper(key.expose())),
    }
    Ok(())
}

pub fn encrypt(args: &Args) -> Result<(), i32> {
    let cipher_kind = resolve_algorithm(args)?;
    let input = required_input(args)?;
    let output = args
        .output
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| encrypted_path_for(input, cipher_kind));

    let key = match args.key.as_deref() {
        Some(path) => Some(Key::load(Path::new(path)).map_err(|err| {
            eprintln!("fatal: {}", Color::error(&err.to_string()));
            1
        })?),
        None => None,
    };
    let key_was_given = key.is_some();
    let key_output = args.key_output.as_deref().map(Path::new);

    let token = CancellationToken::new();
    let used_key = encrypt_file(input, &output, cipher_kind, key, key_output, &token).map_err(|err| {
        eprintln!("fatal: {}", Color::error(&err.to_string()));
        1
    })?;

    println!("encrypted {} -> {}", input.display(), output.display());
    if !key_was_given && key_output.is_none() {
        eprintln!(
            "{}",
            Color::warning(&format!(
                "no --key-out given; generated key (save it, it cannot be recovered): {}",
                hex::encode_upper(used_key.expose())
            ))
        );
    }
    Ok(())
}

pub fn decrypt(args: &Args) -> Result<(), i32> {
    let cipher_kind = resolve_algorithm(args)?;
    let input = required_input(args)?;
    let output = args.output.as_deref().map(PathBuf::from).ok_or_else(|| {
        eprintln!("fatal: {}", Color::error("decrypt requires an output path"));
        2
    })?;
    let key_path = args.key.as_deref().ok_or_else(|| {
        eprintln!("fatal: {}", Color::error("decrypt requires --key"));
        2
    })?;
    let key = Key::load(Path::new(key_path)).map_err(|err| {
        eprintln!("fatal: {}", Color::error(&err.to_string()));
        1
    })?;

    let token = CancellationToken::new();
    match decrypt_file(input, &output, cipher_kind, &key, &token) {
        Ok(true) => {
            println!("decrypted {} -> {}", input.display(), output.display());
            Ok(())
        }
        Ok(false) => {
            eprintln!("fatal: {}", Color::error("decryption failed: wrong key or corrupt container"));
            Err(1)
        }
        Err(err) => {
            eprintln!("fatal: {}", Color::error(&err.to_string()));
            Err(1)
        }
    }
}

pub fn detect(args: &Args) -> Result<(), i32> {
    let input = required_input(args)?;
    let (tag, header) = detect::detect(input);

    if tag.is_empty() {
        println!("unknown");
        return Ok(());
    }

    let name = algorithm::display_name(&tag);
    let source = if header.is_some() { "header" } else { "extension" };
    println!("{} ({tag}, via {source})", Color::none(&name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_algorithm_defaults_to_chacha20() {
        let args = Args::default();
        assert_eq!(resolve_algorithm(&args), Ok(CipherKind::ChaCha20));
    }

    #[test]
    fn resolve_algorithm_rejects_unknown_name() {
        let mut args = Args::default();
        args.algorithm = Some("bogus".to_string());
        assert_eq!(resolve_algorithm(&args), Err(2));
    }

    #[test]
    fn required_input_errors_without_input() {
        let args = Args::default();
        assert_eq!(required_input(&args), Err(2));
    }

    #[test]
    fn genkey_prints_hex_without_key_out() {
        let args = Args::default();
        assert!(genkey(&args).is_ok());
    }

    #[test]
    fn genkey_writes_key_file_with_key_out() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.hex");
        let mut args = Args::default();
        args.key_output = Some(key_path.display().to_string());

        assert!(genkey(&args).is_ok());
        assert!(key_path.exists());
    }

    #[test]
    fn encrypt_decrypt_round_trip_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("plain.txt");
        let encrypted_path = dir.path().join("plain.cc20");
        let decrypted_path = dir.path().join("plain.out");
        let key_path = dir.path().join("key.hex");
        std::fs::write(&input_path, b"hello, veilfile").unwrap();

        let mut encrypt_args = Args::default();
        encrypt_args.input = Some(input_path.display().to_string());
        encrypt_args.output = Some(encrypted_path.display().to_string());
        encrypt_args.key_output = Some(key_path.display().to_string());
        assert!(encrypt(&encrypt_args).is_ok());

        let mut decrypt_args = Args::default();
        decrypt_args.input = Some(encrypted_path.display().to_string());
        decrypt_args.output = Some(decrypted_path.display().to_string());
        decrypt_args.key = Some(key_path.display().to_string());
        assert!(decrypt(&decrypt_args).is_ok());

        assert_eq!(std::fs::read(&decrypted_path).unwrap(), b"hello, veilfile");
    }

    #[test]
    fn decrypt_requires_output_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = Args::default();
        args.input = Some(dir.path().join("missing.cc20").display().to_string());
        assert_eq!(decrypt(&args), Err(2));
    }

    #[test]
    fn detect_reports_unknown_for_unrecognized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery.bin");
        std::fs::write(&path, b"short").unwrap();

        let mut args = Args::default();
        args.input = Some(path.display().to_string());
        assert!(detect(&args).is_ok());
    }
}
