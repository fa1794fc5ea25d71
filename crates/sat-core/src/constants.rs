//! Deployment-fixed constants for the channel key tree and wire formats.
//!
//! Centralized here so the tree engine, subscription builder, frame
//! encoder, and CLI all agree on one set of numbers instead of each
//! crate hard-coding its own copy.

// =============================================================================
// Channel key tree
// =============================================================================

/// Tree height. Matches the 64-bit timestamp space: `2^H` leaves.
///
/// Early source revisions used `height = 4` for local testing; this is the
/// canonical deployment value.
pub const TREE_HEIGHT: u32 = 64;

/// Node key size in bytes (MD5 digest width).
pub const NODE_KEY_BYTES: usize = 16;

// =============================================================================
// Secrets bundle
// =============================================================================

/// Decoder master key size in bytes (HKDF input key material).
pub const DECODER_MASTER_KEY_BYTES: usize = 32;

/// Channel identifier reserved for the always-valid emergency broadcast.
pub const EMERGENCY_CHANNEL: u32 = 0;

// =============================================================================
// Subscription package
// =============================================================================

/// Maximum number of cover nodes a subscription can carry.
///
/// The minimum-cover bound for `TREE_HEIGHT = 64` is `2 * 64 - 1 = 127`
/// nodes; this deployment restricts the wire format to 25 slots, so not
/// every `[start, end]` range is expressible.
pub const MAX_COVER_SLOTS: usize = 25;

/// Bytes per cover slot: 16-byte node number + 16-byte node key, padded.
///
/// The node number is `u128` (LE), not `u64`: a leaf at `TREE_HEIGHT = 64`
/// is numbered `2^64 + t`, which overflows `u64` already at `t = 0`.
pub const COVER_SLOT_BYTES: usize = 128;

/// Size of the encrypted cover block: `MAX_COVER_SLOTS * COVER_SLOT_BYTES`.
pub const COVER_BLOCK_BYTES: usize = MAX_COVER_SLOTS * COVER_SLOT_BYTES;

/// Subscription header size: decoder_id(4) + start(8) + end(8) + channel(4) + nonce(12).
pub const SUBSCRIPTION_HEADER_BYTES: usize = 4 + 8 + 8 + 4 + 12;

/// Ed25519 signature size in bytes.
pub const SIGNATURE_BYTES: usize = 64;

/// Total size of a subscription package.
pub const SUBSCRIPTION_PACKAGE_BYTES: usize =
    SUBSCRIPTION_HEADER_BYTES + COVER_BLOCK_BYTES + SIGNATURE_BYTES;

// =============================================================================
// Frame package
// =============================================================================

/// Frame header size: channel(4) + timestamp(8) + nonce(12).
pub const FRAME_HEADER_BYTES: usize = 4 + 8 + 12;

/// Maximum frame payload length.
pub const MAX_FRAME_PAYLOAD_BYTES: usize = 64;
