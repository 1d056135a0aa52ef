mod utils;

use utils::{checksum, run, scratch_file};

#[test]
fn genkey_prints_a_64_character_uppercase_hex_key() {
    let output = run(&["genkey"]);
    assert_eq!(output.exit_code, 0);

    let key = output.stdout.trim();
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(key, key.to_uppercase());
}

#[test]
fn genkey_with_key_out_writes_a_key_file() {
    let key_path = utils::scratch_file("genkey_key_out.hex", b"");
    let output = run(&["genkey", "--key-out", key_path.to_str().unwrap()]);
    assert_eq!(output.exit_code, 0);

    let contents = std::fs::read_to_string(&key_path).unwrap();
    assert_eq!(contents.len(), 64);
    assert_eq!(contents, contents.to_uppercase());
}

#[test]
fn encrypt_then_decrypt_round_trips_with_explicit_key() {
    let input = scratch_file("round_trip_explicit.txt", b"the quick brown fox jumps over the lazy dog");
    let key_path = scratch_file("round_trip_explicit.hex", b"");
    let encrypted = input.with_extension("cc20");
    let decrypted = input.with_extension("out");

    let keygen = run(&["genkey", "--key-out", key_path.to_str().unwrap()]);
    assert_eq!(keygen.exit_code, 0);

    let encrypt = run(&[
        "encrypt",
        input.to_str().unwrap(),
        encrypted.to_str().unwrap(),
        "--key",
        key_path.to_str().unwrap(),
    ]);
    assert_eq!(encrypt.exit_code, 0, "stderr: {}", encrypt.stderr);
    assert_ne!(checksum(&input), checksum(&encrypted));

    let decrypt = run(&[
        "decrypt",
        encrypted.to_str().unwrap(),
        decrypted.to_str().unwrap(),
        "--key",
        key_path.to_str().unwrap(),
    ]);
    assert_eq!(decrypt.exit_code, 0, "stderr: {}", decrypt.stderr);
    assert_eq!(checksum(&input), checksum(&decrypted));
}

#[test]
fn encrypt_without_key_generates_one_and_warns() {
    let input = scratch_file("round_trip_generated.txt", b"lorem ipsum dolor sit amet");
    let encrypted = input.with_extension("cc20");

    let encrypt = run(&["encrypt", input.to_str().unwrap(), encrypted.to_str().unwrap()]);
    assert_eq!(encrypt.exit_code, 0);
    assert!(encrypted.exists());
    assert!(
        encrypt.stderr.contains("generated key"),
        "expected a warning about the generated key, got: {}",
        encrypt.stderr
    );
}

#[test]
fn encrypt_defaults_output_path_from_algorithm_extension() {
    let input = scratch_file("default_output.txt", b"default output path content");
    let key_path = scratch_file("default_output.hex", b"");
    run(&["genkey", "--key-out", key_path.to_str().unwrap()]);

    let encrypt = run(&["encrypt", input.to_str().unwrap(), "--key", key_path.to_str().unwrap()]);
    assert_eq!(encrypt.exit_code, 0);

    // `encrypted_path_for` appends `.<extension>` to the full original
    // path rather than replacing its existing extension.
    let mut expected = input.clone().into_os_string();
    expected.push(".cc20");
    assert!(std::path::Path::new(&expected).exists());
}

#[test]
fn aes_round_trips_through_the_cli() {
    let input = scratch_file("aes_round_trip.txt", &[0xABu8; 5000]);
    let key_path = scratch_file("aes_round_trip.hex", b"");
    let encrypted = input.with_extension("aes");
    let decrypted = input.with_extension("out");

    run(&["genkey", "-a", "aes", "--key-out", key_path.to_str().unwrap()]);

    let encrypt = run(&[
        "encrypt",
        "-a",
        "aes",
        input.to_str().unwrap(),
        encrypted.to_str().unwrap(),
        "--key",
        key_path.to_str().unwrap(),
    ]);
    assert_eq!(encrypt.exit_code, 0, "stderr: {}", encrypt.stderr);

    let decrypt = run(&[
        "decrypt",
        "-a",
        "aes",
        encrypted.to_str().unwrap(),
        decrypted.to_str().unwrap(),
        "--key",
        key_path.to_str().unwrap(),
    ]);
    assert_eq!(decrypt.exit_code, 0, "stderr: {}", decrypt.stderr);
    assert_eq!(checksum(&input), checksum(&decrypted));
}

#[test]
fn decrypt_with_wrong_key_fails_without_panicking() {
    let input = scratch_file("wrong_key.txt", b"some secret plaintext");
    let key_path = scratch_file("wrong_key_real.hex", b"");
    let wrong_key_path = scratch_file("wrong_key_wrong.hex", b"");
    let encrypted = input.with_extension("aes");
    let decrypted = input.with_extension("out");

    run(&["genkey", "-a", "aes", "--key-out", key_path.to_str().unwrap()]);
    run(&["genkey", "-a", "aes", "--key-out", wrong_key_path.to_str().unwrap()]);

    let encrypt = run(&[
        "encrypt",
        "-a",
        "aes",
        input.to_str().unwrap(),
        encrypted.to_str().unwrap(),
        "--key",
        key_path.to_str().unwrap(),
    ]);
    assert_eq!(encrypt.exit_code, 0);

    let decrypt = run(&[
        "decrypt",
        "-a",
        "aes",
        encrypted.to_str().unwrap(),
        decrypted.to_str().unwrap(),
        "--key",
        wrong_key_path.to_str().unwrap(),
    ]);
    assert_ne!(decrypt.exit_code, 0);
    assert!(!decrypted.exists() || std::fs::read(&decrypted).unwrap() != std::fs::read(&input).unwrap());
}

#[test]
fn detect_identifies_an_encrypted_file_from_its_header() {
    let input = scratch_file("detect_me.txt", b"detect this please");
    let key_path = scratch_file("detect_me.hex", b"");
    let encrypted = input.with_extension("cc20");

    run(&["genkey", "--key-out", key_path.to_str().unwrap()]);
    run(&[
        "encrypt",
        input.to_str().unwrap(),
        encrypted.to_str().unwrap(),
        "--key",
        key_path.to_str().unwrap(),
    ]);

    let detect = run(&["detect", encrypted.to_str().unwrap()]);
    assert_eq!(detect.exit_code, 0);
    assert!(detect.stdout.contains("CC20"));
    assert!(detect.stdout.contains("header"));
}

#[test]
fn detect_reports_unknown_for_plain_files() {
    let input = scratch_file("detect_unknown.bin", b"just some bytes, not a container");
    let detect = run(&["detect", input.to_str().unwrap()]);
    assert_eq!(detect.exit_code, 0);
    assert_eq!(detect.stdout.trim(), "unknown");
}

#[test]
fn encrypt_reports_missing_input() {
    let output = run(&["encrypt", "/nonexistent/path/to/nowhere.txt"]);
    assert_ne!(output.exit_code, 0);
    assert!(output.stderr.contains("not found") || output.stderr.contains("fatal"));
}

#[test]
fn decrypt_requires_key_and_output() {
    let input = scratch_file("decrypt_needs_key.cc20", b"irrelevant bytes");
    let output = run(&["decrypt", input.to_str().unwrap()]);
    assert_ne!(output.exit_code, 0);
}

#[test]
fn short_help_and_version_exit_cleanly() {
    let help = run(&["-h"]);
    assert_eq!(help.exit_code, 0);
    assert!(help.stdout.contains("Usage:"));

    let version = run(&["-V"]);
    assert_eq!(version.exit_code, 0);
    assert!(version.stdout.contains("veilfile"));
}
