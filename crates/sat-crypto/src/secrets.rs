//! Secrets bundle: the host's persistent, private configuration.
//!
//! Holds one 128-bit root key per channel (including the implicit
//! emergency channel `0`), the 256-bit decoder master key, and the
//! host's Ed25519 signing keypair. This is the only state the host
//! process keeps across calls; everything else in `sat-crypto` is
//! derived per-request.

use std::collections::BTreeMap;

use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use sat_core::constants::{DECODER_MASTER_KEY_BYTES, EMERGENCY_CHANNEL, NODE_KEY_BYTES};
use sat_core::{Result, SatError};

use crate::primitives::{rand_bytes, SecureRandom};

/// The host's persistent secrets: channel roots, decoder master key, and
/// host signing keypair.
///
/// Channel roots and the decoder master key are zeroized on drop; the
/// signing key is wiped by `ed25519-dalek`'s own `Drop` impl.
#[derive(Debug, Clone)]
pub struct SecretsBundle {
    channels: BTreeMap<u32, [u8; NODE_KEY_BYTES]>,
    decoder_dk: [u8; DECODER_MASTER_KEY_BYTES],
    host_key_priv: SigningKey,
    host_key_pub: VerifyingKey,
}

/// Wire form of [`SecretsBundle`]: the JSON object the host persists to
/// disk. Uses the DER-hex dual-key form for the host key
/// (`host_key_priv` / `host_key_pub`), not a single PEM-encoded
/// `"host_key"`.
#[derive(Debug, Serialize, Deserialize)]
struct SecretsJson {
    channels: BTreeMap<String, String>,
    decoder_dk: String,
    host_key_priv: String,
    host_key_pub: String,
}

impl SecretsBundle {
    /// Generate a fresh secrets bundle for the given channel set.
    ///
    /// Channel `0` (the emergency broadcast) is always included and need
    /// not be passed in; duplicate channel numbers collapse.
    pub fn generate(channels: &[u32], rng: &mut impl SecureRandom) -> Self {
        let mut channel_set: BTreeMap<u32, [u8; NODE_KEY_BYTES]> = BTreeMap::new();
        for &channel in channels.iter().chain(std::iter::once(&EMERGENCY_CHANNEL)) {
            channel_set
                .entry(channel)
                .or_insert_with(|| rand_key16(rng));
        }

        let mut decoder_dk = [0u8; DECODER_MASTER_KEY_BYTES];
        rng.fill(&mut decoder_dk);

        let mut signing_key_bytes = [0u8; 32];
        rng.fill(&mut signing_key_bytes);
        let host_key_priv = SigningKey::from_bytes(&signing_key_bytes);
        signing_key_bytes.zeroize();
        let host_key_pub = host_key_priv.verifying_key();

        Self {
            channels: channel_set,
            decoder_dk,
            host_key_priv,
            host_key_pub,
        }
    }

    /// The root key for `channel`, or `None` if it was never provisioned.
    pub fn channel_root(&self, channel: u32) -> Option<[u8; NODE_KEY_BYTES]> {
        self.channels.get(&channel).copied()
    }

    /// Whether `channel` has a provisioned root key.
    pub fn has_channel(&self, channel: u32) -> bool {
        self.channels.contains_key(&channel)
    }

    /// The decoder master key, the HKDF input for per-device keys.
    pub fn decoder_master_key(&self) -> &[u8; DECODER_MASTER_KEY_BYTES] {
        &self.decoder_dk
    }

    /// The host's Ed25519 signing key.
    pub fn host_signing_key(&self) -> &SigningKey {
        &self.host_key_priv
    }

    /// The host's Ed25519 verifying key.
    pub fn host_verifying_key(&self) -> &VerifyingKey {
        &self.host_key_pub
    }

    /// Serialize to the canonical JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let channels = self
            .channels
            .iter()
            .map(|(channel, key)| (channel.to_string(), hex::encode(key)))
            .collect();

        let host_key_priv = self
            .host_key_priv
            .to_pkcs8_der()
            .map_err(|e| SatError::serialization(format!("DER-encoding host private key: {e}")))?;
        let host_key_pub = self
            .host_key_pub
            .to_public_key_der()
            .map_err(|e| SatError::serialization(format!("DER-encoding host public key: {e}")))?;

        let wire = SecretsJson {
            channels,
            decoder_dk: hex::encode(self.decoder_dk),
            host_key_priv: hex::encode(host_key_priv.as_bytes()),
            host_key_pub: hex::encode(host_key_pub.as_bytes()),
        };

        Ok(serde_json::to_vec(&wire)?)
    }

    /// Parse the canonical JSON wire form.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let wire: SecretsJson = serde_json::from_slice(bytes)?;

        let mut channels = BTreeMap::new();
        for (channel_str, hex_key) in wire.channels {
            let channel: u32 = channel_str
                .parse()
                .map_err(|_| SatError::serialization(format!("invalid channel id {channel_str:?}")))?;
            let key = parse_hex_array::<NODE_KEY_BYTES>(&hex_key, "channel root key")?;
            channels.insert(channel, key);
        }
        if !channels.contains_key(&EMERGENCY_CHANNEL) {
            return Err(SatError::serialization(
                "secrets bundle is missing the emergency channel (0) root key",
            ));
        }

        let decoder_dk = parse_hex_array::<DECODER_MASTER_KEY_BYTES>(&wire.decoder_dk, "decoder_dk")?;

        let priv_der = hex::decode(&wire.host_key_priv)?;
        let host_key_priv = SigningKey::from_pkcs8_der(&priv_der)
            .map_err(|e| SatError::serialization(format!("invalid host_key_priv DER: {e}")))?;

        let pub_der = hex::decode(&wire.host_key_pub)?;
        let host_key_pub = VerifyingKey::from_public_key_der(&pub_der)
            .map_err(|e| SatError::serialization(format!("invalid host_key_pub DER: {e}")))?;

        Ok(Self {
            channels,
            decoder_dk,
            host_key_priv,
            host_key_pub,
        })
    }
}

impl Drop for SecretsBundle {
    fn drop(&mut self) {
        for key in self.channels.values_mut() {
            key.zeroize();
        }
        self.decoder_dk.zeroize();
    }
}

fn rand_key16(rng: &mut impl SecureRandom) -> [u8; NODE_KEY_BYTES] {
    let bytes = rand_bytes(rng, NODE_KEY_BYTES);
    let mut out = [0u8; NODE_KEY_BYTES];
    out.copy_from_slice(&bytes);
    out
}

fn parse_hex_array<const N: usize>(hex_str: &str, what: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(hex_str)?;
    if bytes.len() != N {
        return Err(SatError::serialization(format!(
            "{what} must be {N} bytes, got {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}
