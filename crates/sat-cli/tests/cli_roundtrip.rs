//! End-to-end file-I/O round trip for the `satctl` subcommands: generate
//! secrets, build a subscription package from them, and encode a frame,
//! all through real temp-directory paths rather than in-memory buffers.

use tempfile::tempdir;

use sat_cli::{encode_frame_cmd, gen_secrets, gen_subscription};
use sat_crypto::SecretsBundle;

#[test]
fn gen_secrets_writes_a_parseable_secrets_file() {
    let dir = tempdir().unwrap();
    let secrets_path = dir.path().join("secrets.json");

    gen_secrets(&[1, 3, 4], &secrets_path).unwrap();

    let bytes = std::fs::read(&secrets_path).unwrap();
    let bundle = SecretsBundle::from_json(&bytes).unwrap();
    assert!(bundle.has_channel(0));
    assert!(bundle.has_channel(1));
    assert!(bundle.has_channel(3));
    assert!(bundle.has_channel(4));
}

#[test]
fn gen_subscription_writes_a_3300_byte_package() {
    let dir = tempdir().unwrap();
    let secrets_path = dir.path().join("secrets.json");
    let sub_path = dir.path().join("sub.bin");

    gen_secrets(&[7], &secrets_path).unwrap();
    gen_subscription(&secrets_path, 42, 7, 1_000, 2_000, &sub_path).unwrap();

    let package = std::fs::read(&sub_path).unwrap();
    assert_eq!(package.len(), 3300);
}

#[test]
fn encode_frame_cmd_writes_a_signed_frame_and_rejects_oversized_payload() {
    let dir = tempdir().unwrap();
    let secrets_path = dir.path().join("secrets.json");
    let frame_path = dir.path().join("frame.bin");

    gen_secrets(&[5], &secrets_path).unwrap();
    encode_frame_cmd(&secrets_path, 5, 123_456, "deadbeef", &frame_path).unwrap();

    let frame = std::fs::read(&frame_path).unwrap();
    // header (24) + 4-byte payload + 64-byte signature
    assert_eq!(frame.len(), 24 + 4 + 64);

    let oversized_hex = "00".repeat(65);
    assert!(encode_frame_cmd(&secrets_path, 5, 1, &oversized_hex, &frame_path).is_err());
}

#[test]
fn gen_subscription_rejects_unknown_channel_and_leaves_no_partial_output() {
    let dir = tempdir().unwrap();
    let secrets_path = dir.path().join("secrets.json");
    let sub_path = dir.path().join("sub.bin");

    gen_secrets(&[7], &secrets_path).unwrap();
    let result = gen_subscription(&secrets_path, 42, 99, 0, 10, &sub_path);

    assert!(result.is_err());
    assert!(!sub_path.exists());
}
