//! Encrypted broadcast frames: one ChaCha20-encrypted payload per
//! `(channel, timestamp)`, keyed by the channel tree's leaf key and
//! signed by the host.
//!
//! Wire layout (variable length, header + ciphertext + signature):
//!
//! ```text
//! [0..4)           channel    u32 LE
//! [4..12)          timestamp  u64 LE
//! [12..24)         nonce      12 bytes
//! [24..24+n)       ciphertext n bytes, n <= MAX_FRAME_PAYLOAD_BYTES
//! [24+n..24+n+64)  signature  64-byte Ed25519 signature over bytes[0..24+n]
//! ```

use ed25519_dalek::VerifyingKey;

use sat_core::constants::{FRAME_HEADER_BYTES, MAX_FRAME_PAYLOAD_BYTES, SIGNATURE_BYTES};
use sat_core::{Result, SatError};

use crate::primitives::{extend16to32, rand_nonce12, sign, stream_apply, verify, SecureRandom};
use crate::secrets::SecretsBundle;
use crate::tree::ChannelKeyDerivation;

/// A decoded frame: the channel and timestamp it was broadcast under, and
/// its recovered plaintext payload.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub channel: u32,
    pub timestamp: u64,
    pub payload: Vec<u8>,
}

/// A frame's header fields, once its Ed25519 signature has been checked.
///
/// Produced by [`verify_frame`], the step-1 signature check that must run
/// *before* any subscription lookup, range check, or replay check — a
/// verifier that inspects header fields before authenticating them would
/// let a forged packet influence its own rejection reason.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub channel: u32,
    pub timestamp: u64,
    nonce: [u8; 12],
    signed_len: usize,
}

/// Encrypt `payload` for broadcast on `channel` at `timestamp`, signed by
/// the host.
///
/// Fails with [`SatError::UnknownChannel`] if `channel` has no
/// provisioned root, or with [`SatError::Range`] if `payload` exceeds
/// [`MAX_FRAME_PAYLOAD_BYTES`](sat_core::constants::MAX_FRAME_PAYLOAD_BYTES).
pub fn encode_frame(
    secrets: &SecretsBundle,
    channel: u32,
    timestamp: u64,
    payload: &[u8],
    rng: &mut impl SecureRandom,
) -> Result<Vec<u8>> {
    if payload.len() > MAX_FRAME_PAYLOAD_BYTES {
        return Err(SatError::range(format!(
            "payload is {} bytes, exceeds the {MAX_FRAME_PAYLOAD_BYTES}-byte frame limit",
            payload.len()
        )));
    }
    let root = secrets
        .channel_root(channel)
        .ok_or_else(|| SatError::unknown_channel(format!("no root key provisioned for channel {channel}")))?;

    let tree = ChannelKeyDerivation::new(root);
    let leaf_key = tree.leaf_key(timestamp);
    let stream_key = extend16to32(&leaf_key);
    let nonce = rand_nonce12(rng);

    let mut frame = Vec::with_capacity(FRAME_HEADER_BYTES + payload.len() + SIGNATURE_BYTES);
    frame.extend_from_slice(&channel.to_le_bytes());
    frame.extend_from_slice(&timestamp.to_le_bytes());
    frame.extend_from_slice(&nonce);

    let mut ciphertext = payload.to_vec();
    stream_apply(&stream_key, &nonce, &mut ciphertext);
    frame.extend_from_slice(&ciphertext);

    let signature = sign(secrets.host_signing_key(), &frame);
    frame.extend_from_slice(&signature);

    Ok(frame)
}

/// Verify a frame's Ed25519 signature and parse its header, without
/// touching any leaf key or subscription state.
///
/// This is step 1 of the decoder's acceptance sequence: authentication
/// happens before the channel/timestamp it reports are trusted for a
/// subscription lookup, range check, or replay check.
pub fn verify_frame(frame: &[u8], host_verifying_key: &VerifyingKey) -> Result<FrameHeader> {
    if frame.len() < FRAME_HEADER_BYTES + SIGNATURE_BYTES {
        return Err(SatError::serialization("frame is shorter than the fixed header and signature"));
    }

    let signed_len = frame.len() - SIGNATURE_BYTES;
    let mut signature = [0u8; SIGNATURE_BYTES];
    signature.copy_from_slice(&frame[signed_len..]);
    verify(host_verifying_key, &frame[..signed_len], &signature)?;

    let channel = u32::from_le_bytes(frame[0..4].try_into().unwrap());
    let timestamp = u64::from_le_bytes(frame[4..12].try_into().unwrap());
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&frame[12..24]);

    Ok(FrameHeader {
        channel,
        timestamp,
        nonce,
        signed_len,
    })
}

/// Decrypt an already-authenticated frame's payload with `leaf_key`.
///
/// Call this only after [`verify_frame`] has checked the signature over
/// `frame` and the caller has derived `leaf_key` for its channel/timestamp.
pub fn decrypt_frame(frame: &[u8], header: &FrameHeader, leaf_key: &[u8; 16]) -> DecodedFrame {
    let stream_key = extend16to32(leaf_key);
    let mut payload = frame[24..header.signed_len].to_vec();
    stream_apply(&stream_key, &header.nonce, &mut payload);

    DecodedFrame {
        channel: header.channel,
        timestamp: header.timestamp,
        payload,
    }
}

/// Verify and decrypt a frame using a leaf key already recovered from a
/// subscription's cover (see [`crate::tree::key_for_timestamp_from_cover`]).
///
/// Convenience wrapper over [`verify_frame`] + [`decrypt_frame`] for
/// callers that already have `leaf_key` in hand and don't need to act on
/// the header before decryption (e.g. the encode/decode round-trip tests
/// below). [`DecoderVerifier::decode`](crate::decoder::DecoderVerifier::decode)
/// calls the two steps separately so the signature check runs first.
pub fn decode_frame(
    frame: &[u8],
    leaf_key: &[u8; 16],
    host_verifying_key: &VerifyingKey,
) -> Result<DecodedFrame> {
    let header = verify_frame(frame, host_verifying_key)?;
    Ok(decrypt_frame(frame, &header, leaf_key))
}
