//! Subscription packages: host-issued grants of channel access to a
//! decoder over a timestamp range, encoding the channel's minimum
//! cover nodes encrypted under the target decoder's device key.
//!
//! Wire layout (`SUBSCRIPTION_PACKAGE_BYTES` = 3300 bytes):
//!
//! ```text
//! [0..4)     decoder_id   u32 LE
//! [4..12)    start        u64 LE
//! [12..20)   end          u64 LE
//! [20..24)   channel      u32 LE
//! [24..36)   nonce        12 bytes
//! [36..3236) cover block  25 slots * 128 bytes, ChaCha20-encrypted
//! [3236..3300) signature  64-byte Ed25519 signature over bytes[0..3236]
//! ```
//!
//! Each cover slot is `node_num: u128 LE (16 bytes)` followed by
//! `node_key: [u8; 16]`, zero-padded to 128 bytes. Unused slots are
//! left as all-zero plaintext before encryption.

use ed25519_dalek::VerifyingKey;

use sat_core::constants::{
    COVER_BLOCK_BYTES, COVER_SLOT_BYTES, EMERGENCY_CHANNEL, MAX_COVER_SLOTS, NODE_KEY_BYTES,
    SIGNATURE_BYTES, SUBSCRIPTION_HEADER_BYTES, SUBSCRIPTION_PACKAGE_BYTES,
};
use sat_core::{Result, SatError};

use crate::primitives::{derive_device_key, rand_nonce12, sign, stream_apply, verify, NodeKey, SecureRandom};
use crate::secrets::SecretsBundle;
use crate::tree::{ChannelKeyDerivation, NodeNum};

/// A subscription package parsed and decrypted on the decoder side: the
/// channel, its granted timestamp range, and the cover nodes needed to
/// derive any leaf key within that range.
#[derive(Debug, Clone)]
pub struct OpenedSubscription {
    pub channel: u32,
    pub start: u64,
    pub end: u64,
    pub cover: Vec<(NodeNum, NodeKey)>,
}

/// Build a subscription package granting `decoder_id` access to `channel`
/// over `[start, end]`.
///
/// Fails with [`SatError::UnknownChannel`] if `channel` has no provisioned
/// root in `secrets` (this includes the emergency channel, which a host
/// never needs to subscribe explicitly — decoders always treat it as
/// granted). Fails with [`SatError::CoverTooLarge`] if the range's minimum
/// cover exceeds the wire format's `MAX_COVER_SLOTS` slots.
pub fn build_subscription(
    secrets: &SecretsBundle,
    decoder_id: u32,
    channel: u32,
    start: u64,
    end: u64,
    rng: &mut impl SecureRandom,
) -> Result<Vec<u8>> {
    if channel == EMERGENCY_CHANNEL {
        return Err(SatError::unknown_channel(
            "channel 0 is always granted and cannot be the subject of a subscription",
        ));
    }
    let root = secrets
        .channel_root(channel)
        .ok_or_else(|| SatError::unknown_channel(format!("no root key provisioned for channel {channel}")))?;

    let tree = ChannelKeyDerivation::new(root);
    let cover = tree.minimum_cover(start, end)?;
    if cover.len() > MAX_COVER_SLOTS {
        return Err(SatError::cover_too_large(format!(
            "range [{start}, {end}] requires {} cover nodes, exceeds the {MAX_COVER_SLOTS}-slot limit",
            cover.len()
        )));
    }

    let mut package = vec![0u8; SUBSCRIPTION_PACKAGE_BYTES];
    package[0..4].copy_from_slice(&decoder_id.to_le_bytes());
    package[4..12].copy_from_slice(&start.to_le_bytes());
    package[12..20].copy_from_slice(&end.to_le_bytes());
    package[20..24].copy_from_slice(&channel.to_le_bytes());

    let nonce = rand_nonce12(rng);
    package[24..36].copy_from_slice(&nonce);

    let cover_start = SUBSCRIPTION_HEADER_BYTES;
    for (slot, &node) in cover.iter().enumerate() {
        let offset = cover_start + slot * COVER_SLOT_BYTES;
        let key = tree.key_at(node);
        package[offset..offset + 16].copy_from_slice(&node.to_le_bytes());
        package[offset + 16..offset + 16 + NODE_KEY_BYTES].copy_from_slice(&key);
    }

    let device_key = derive_device_key(secrets.decoder_master_key(), decoder_id);
    let cover_block = &mut package[cover_start..cover_start + COVER_BLOCK_BYTES];
    stream_apply(&device_key, &nonce, cover_block);

    let signature = sign(secrets.host_signing_key(), &package[..cover_start + COVER_BLOCK_BYTES]);
    package[cover_start + COVER_BLOCK_BYTES..].copy_from_slice(&signature);

    Ok(package)
}

/// Parse, verify, and decrypt a subscription package addressed to
/// `decoder_id`.
///
/// Fails if the package is malformed, the signature does not verify
/// against `host_verifying_key`, or `start > end`.
pub fn open_subscription(
    package: &[u8],
    decoder_id: u32,
    decoder_master_key: &[u8; 32],
    host_verifying_key: &VerifyingKey,
) -> Result<OpenedSubscription> {
    if package.len() != SUBSCRIPTION_PACKAGE_BYTES {
        return Err(SatError::serialization(format!(
            "subscription package must be {SUBSCRIPTION_PACKAGE_BYTES} bytes, got {}",
            package.len()
        )));
    }

    let cover_start = SUBSCRIPTION_HEADER_BYTES;
    let signed_len = cover_start + COVER_BLOCK_BYTES;

    let mut signature = [0u8; SIGNATURE_BYTES];
    signature.copy_from_slice(&package[signed_len..]);
    verify(host_verifying_key, &package[..signed_len], &signature)?;

    let header_decoder_id = u32::from_le_bytes(package[0..4].try_into().unwrap());
    if header_decoder_id != decoder_id {
        return Err(SatError::crypto(
            "subscription package is not addressed to this decoder",
        ));
    }

    let start = u64::from_le_bytes(package[4..12].try_into().unwrap());
    let end = u64::from_le_bytes(package[12..20].try_into().unwrap());
    let channel = u32::from_le_bytes(package[20..24].try_into().unwrap());
    if start > end {
        return Err(SatError::range(format!("start ({start}) exceeds end ({end})")));
    }
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&package[24..36]);

    let device_key = derive_device_key(decoder_master_key, decoder_id);
    let mut cover_block = package[cover_start..signed_len].to_vec();
    stream_apply(&device_key, &nonce, &mut cover_block);

    let mut cover = Vec::with_capacity(MAX_COVER_SLOTS);
    for slot in 0..MAX_COVER_SLOTS {
        let offset = slot * COVER_SLOT_BYTES;
        let node_bytes = &cover_block[offset..offset + 16];
        let node = NodeNum::from_le_bytes(node_bytes.try_into().unwrap());
        if node == 0 {
            continue; // unused slot
        }
        let mut key = [0u8; NODE_KEY_BYTES];
        key.copy_from_slice(&cover_block[offset + 16..offset + 16 + NODE_KEY_BYTES]);
        cover.push((node, key));
    }

    Ok(OpenedSubscription {
        channel,
        start,
        end,
        cover,
    })
}
