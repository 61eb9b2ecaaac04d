//! CLI integration tests for lookalike-cli.
//!
//! These tests run the actual binary and check outputs and exit codes.
//! None of them need a running server.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the lookalike binary.
fn lookalike() -> Command {
    Command::cargo_bin("lookalike").unwrap()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    lookalike()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate image detection"))
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("params"))
        .stdout(predicate::str::contains("key"));
}

#[test]
fn test_version_displays_version() {
    lookalike()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lookalike"));
}

#[test]
fn test_help_shows_exit_codes() {
    lookalike()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("69"));
}

#[test]
fn test_submit_help_shows_options() {
    lookalike()
        .args(["submit", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--structural-hash"))
        .stdout(predicate::str::contains("--signature-file"))
        .stdout(predicate::str::contains("--dry-run"));
}

// ============================================================================
// Params Tests
// ============================================================================

#[test]
fn test_params_default_threshold() {
    lookalike()
        .args(["params", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bands\": 64"))
        .stdout(predicate::str::contains("\"rows\": 2"));
}

#[test]
fn test_params_human_output() {
    lookalike()
        .args(["params", "--threshold", "0.5", "--num-perm", "128"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bands x rows:"));
}

#[test]
fn test_params_rejects_bad_threshold() {
    lookalike()
        .args(["params", "--threshold", "1.5"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("threshold"));
}

// ============================================================================
// Key Tests
// ============================================================================

#[test]
fn test_key_decode() {
    lookalike()
        .args(["key", "decode", "abc:00000000000000ff:room:alice:1700000000", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"group_id\": \"room\""))
        .stdout(predicate::str::contains("\"structural_hash\": 255"));
}

#[test]
fn test_key_decode_malformed() {
    lookalike()
        .args(["key", "decode", "only:three:fields"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Malformed key"));
}

#[test]
fn test_key_encode() {
    lookalike()
        .args([
            "key",
            "encode",
            "--content-hash",
            "abc",
            "--structural-hash",
            "ff",
            "--group",
            "room",
            "--user",
            "alice",
            "--timestamp",
            "1700000000",
        ])
        .assert()
        .success()
        .stdout("abc:00000000000000ff:room:alice:1700000000\n");
}

#[test]
fn test_key_encode_rejects_delimiter() {
    lookalike()
        .args([
            "key",
            "encode",
            "--content-hash",
            "abc",
            "--structural-hash",
            "ff",
            "--group",
            "room:1",
            "--user",
            "alice",
            "--timestamp",
            "1",
        ])
        .assert()
        .code(65);
}

// ============================================================================
// Submit Tests (offline)
// ============================================================================

#[test]
fn test_submit_dry_run_hashes_file() {
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("empty.jpg");
    fs::write(&image, b"").unwrap();

    lookalike()
        .args([
            "submit",
            "--file",
            image.to_str().unwrap(),
            "--structural-hash",
            "ff",
            "--signature",
            "1,2,3,4",
            "--group",
            "room",
            "--user",
            "alice",
            "--timestamp",
            "42",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a",
        ))
        .stdout(predicate::str::contains("\"structural_hash\": \"00000000000000ff\""))
        .stdout(predicate::str::contains("\"timestamp\": 42"));
}

#[test]
fn test_submit_signature_file_text() {
    let temp = TempDir::new().unwrap();
    let sig = temp.path().join("sig.txt");
    fs::write(&sig, "10 20 30\n40\n").unwrap();

    lookalike()
        .args([
            "submit",
            "--content-hash",
            "abc",
            "--structural-hash",
            "0",
            "--signature-file",
            sig.to_str().unwrap(),
            "--group",
            "room",
            "--user",
            "alice",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"signature\""));
}

#[test]
fn test_submit_missing_file_returns_input_error() {
    // Exit code 66 = EX_NOINPUT
    lookalike()
        .args([
            "submit",
            "--file",
            "nonexistent_file.jpg",
            "--structural-hash",
            "ff",
            "--signature",
            "1,2",
            "--group",
            "room",
            "--user",
            "alice",
            "--dry-run",
        ])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_submit_requires_content_source() {
    lookalike()
        .args([
            "submit",
            "--structural-hash",
            "ff",
            "--signature",
            "1,2",
            "--group",
            "room",
            "--user",
            "alice",
        ])
        .assert()
        .failure();
}

#[test]
fn test_submit_unreachable_server_returns_network_error() {
    // Port 9 (discard) is not expected to host an HTTP server
    lookalike()
        .env_remove("LOOKALIKE_URL")
        .args([
            "submit",
            "--server",
            "http://127.0.0.1:9",
            "--content-hash",
            "abc",
            "--structural-hash",
            "ff",
            "--signature",
            "1,2",
            "--group",
            "room",
            "--user",
            "alice",
        ])
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .code(69);
}
