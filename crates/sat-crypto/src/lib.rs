//! Channel key tree, subscription packages, and broadcast frames for the
//! satellite-TV keying system.
//!
//! This crate is synchronous and has no I/O of its own: [`secrets`],
//! [`subscription`], and [`frame`] operate on in-memory bytes, and the
//! only state that survives a call is what [`decoder::DecoderVerifier`]
//! holds deliberately (installed subscriptions and last-accepted
//! timestamps, for replay rejection).

pub mod decoder;
pub mod frame;
pub mod primitives;
pub mod secrets;
pub mod subscription;
pub mod tree;

pub use decoder::DecoderVerifier;
pub use frame::{decode_frame, encode_frame, DecodedFrame};
pub use primitives::SecureRandom;
pub use secrets::SecretsBundle;
pub use subscription::{build_subscription, open_subscription, OpenedSubscription};
pub use tree::{ChannelKeyDerivation, NodeNum};
