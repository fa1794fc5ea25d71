//! Command implementations backing the `satctl` binary.
//!
//! Kept in a library so the file-I/O round trip each subcommand performs
//! is reachable from `tests/` without shelling out to the built binary.
//! `main.rs` stays a thin `clap` wrapper over these functions.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::OsRng;

use sat_crypto::{build_subscription, encode_frame, SecretsBundle};

/// Generate a fresh secrets bundle for `channels` and write it as JSON
/// to `out` (channel 0 is always included; see [`SecretsBundle::generate`]).
pub fn gen_secrets(channels: &[u32], out: &Path) -> Result<()> {
    let bundle = SecretsBundle::generate(channels, &mut OsRng);
    let json = bundle.to_json().context("serializing secrets bundle")?;
    fs::write(out, json).with_context(|| format!("writing secrets to {}", out.display()))?;
    tracing::info!(channels = ?channels, path = %out.display(), "generated secrets bundle");
    Ok(())
}

/// Read a secrets bundle from `secrets_path`, build a subscription
/// package for `(decoder_id, channel, start, end)`, and write the
/// 3300-byte package to `out`.
pub fn gen_subscription(
    secrets_path: &Path,
    decoder_id: u32,
    channel: u32,
    start: u64,
    end: u64,
    out: &Path,
) -> Result<()> {
    let secrets_json = fs::read(secrets_path)
        .with_context(|| format!("reading secrets from {}", secrets_path.display()))?;
    let secrets = SecretsBundle::from_json(&secrets_json).context("parsing secrets bundle")?;

    let package = build_subscription(&secrets, decoder_id, channel, start, end, &mut OsRng)
        .context("building subscription package")?;
    fs::write(out, &package).with_context(|| format!("writing subscription to {}", out.display()))?;
    tracing::info!(
        decoder_id,
        channel,
        start,
        end,
        bytes = package.len(),
        path = %out.display(),
        "built subscription package"
    );
    Ok(())
}

/// Read a secrets bundle from `secrets_path`, encrypt and sign
/// `payload_hex` for `(channel, timestamp)`, and write the frame package
/// to `out`.
pub fn encode_frame_cmd(
    secrets_path: &Path,
    channel: u32,
    timestamp: u64,
    payload_hex: &str,
    out: &Path,
) -> Result<()> {
    let secrets_json = fs::read(secrets_path)
        .with_context(|| format!("reading secrets from {}", secrets_path.display()))?;
    let secrets = SecretsBundle::from_json(&secrets_json).context("parsing secrets bundle")?;

    let payload = hex::decode(payload_hex).context("decoding --payload-hex")?;
    let frame = encode_frame(&secrets, channel, timestamp, &payload, &mut OsRng)
        .context("encoding broadcast frame")?;
    fs::write(out, &frame).with_context(|| format!("writing frame to {}", out.display()))?;
    tracing::info!(
        channel,
        timestamp,
        bytes = frame.len(),
        path = %out.display(),
        "encoded broadcast frame"
    );
    Ok(())
}
