//! Reference decoder-side verifier: the minimal state a decoder keeps
//! and the checks it applies before handing a frame's plaintext back to
//! the caller.
//!
//! Mirrors the acceptance logic a real decoder would run: signature
//! verification, subscription lookup, range membership, and
//! strictly-increasing timestamps per channel to reject replays.

use std::collections::HashMap;

use ed25519_dalek::VerifyingKey;

use sat_core::constants::EMERGENCY_CHANNEL;
use sat_core::{Result, SatError};

use crate::frame::{decrypt_frame, verify_frame};
use crate::primitives::NodeKey;
use crate::subscription::{open_subscription, OpenedSubscription};
use crate::tree::{ChannelKeyDerivation, key_for_timestamp_from_cover};

/// A decoder's view of the world: its own subscriptions and the last
/// timestamp it accepted per channel (for replay rejection).
///
/// The emergency channel (`0`) has no subscription entry; every decoder
/// ships with its root key baked in out-of-band (it is shared across a
/// deployment's emergency broadcasts) and treats it as granted over the
/// full timestamp range.
pub struct DecoderVerifier {
    decoder_id: u32,
    decoder_master_key: [u8; 32],
    host_verifying_key: VerifyingKey,
    emergency_channel_root: NodeKey,
    subscriptions: HashMap<u32, OpenedSubscription>,
    last_accepted: HashMap<u32, u64>,
}

impl DecoderVerifier {
    /// Construct a verifier for `decoder_id`, holding no subscriptions
    /// yet beyond the implicit emergency channel, whose root key every
    /// decoder is provisioned with out-of-band.
    pub fn new(
        decoder_id: u32,
        decoder_master_key: [u8; 32],
        host_verifying_key: VerifyingKey,
        emergency_channel_root: NodeKey,
    ) -> Self {
        Self {
            decoder_id,
            decoder_master_key,
            host_verifying_key,
            emergency_channel_root,
            subscriptions: HashMap::new(),
            last_accepted: HashMap::new(),
        }
    }

    /// Install a subscription package, replacing any existing grant for
    /// its channel.
    pub fn add_subscription(&mut self, package: &[u8]) -> Result<()> {
        let opened = open_subscription(
            package,
            self.decoder_id,
            &self.decoder_master_key,
            &self.host_verifying_key,
        )?;
        self.subscriptions.insert(opened.channel, opened);
        Ok(())
    }

    /// Verify, decrypt, and admit a frame.
    ///
    /// Checks, in order: (1) Ed25519 signature — nothing about the
    /// frame's header is trusted before this; (2) subscription presence
    /// and range coverage for non-emergency channels; (3) that the
    /// frame's timestamp strictly exceeds the last one accepted for that
    /// channel; (4) cover-derived leaf key; (5) decrypt. Updates
    /// `last_accepted` only on success.
    pub fn decode(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        let header = verify_frame(frame, &self.host_verifying_key)?;
        let channel = header.channel;
        let timestamp = header.timestamp;

        if let Some(&last) = self.last_accepted.get(&channel) {
            if timestamp <= last {
                return Err(SatError::replay(format!(
                    "timestamp {timestamp} did not advance past last accepted {last} on channel {channel}"
                )));
            }
        }

        let leaf_key = if channel == EMERGENCY_CHANNEL {
            ChannelKeyDerivation::new(self.emergency_channel_root).leaf_key(timestamp)
        } else {
            let sub = self
                .subscriptions
                .get(&channel)
                .ok_or_else(|| SatError::unknown_channel(format!("no subscription installed for channel {channel}")))?;
            if timestamp < sub.start || timestamp > sub.end {
                return Err(SatError::not_covered(format!(
                    "timestamp {timestamp} is outside subscribed range [{}, {}]",
                    sub.start, sub.end
                )));
            }
            key_for_timestamp_from_cover(sat_core::constants::TREE_HEIGHT, &sub.cover, timestamp)?
        };

        let decoded = decrypt_frame(frame, &header, &leaf_key);
        self.last_accepted.insert(channel, timestamp);
        Ok(decoded.payload)
    }
}
