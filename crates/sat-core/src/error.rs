//! Unified error type for the satctl keying core.
//!
//! One enum, one context string per variant, so callers can match on
//! `kind()` without string-sniffing the message. Every failure mode the
//! keying core can produce — crypto, serialization, unknown channel,
//! range, cover sizing, decoder-side coverage and replay rejection — gets
//! its own variant.

use serde::{Deserialize, Serialize};

/// Error kind, for callers that want to branch on category without
/// matching the full message-carrying enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Signature verification, ChaCha20 misuse, or HKDF parameter error.
    Crypto,
    /// Malformed secrets JSON, wrong hex length, or bad DER.
    Serialization,
    /// Channel not present in the secrets bundle.
    UnknownChannel,
    /// `start > end`, or a timestamp outside `[0, 2^64 - 1]`.
    Range,
    /// Minimum cover exceeds the deployment-fixed slot count.
    CoverTooLarge,
    /// Decoder-side: timestamp lies outside every node's range in a cover.
    NotCovered,
    /// Decoder-side: timestamp is not strictly greater than the last
    /// accepted timestamp for that channel.
    Replay,
}

/// Unified error type for all satctl keying operations.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum SatError {
    /// Cryptographic operation failed.
    #[error("crypto error: {message}")]
    Crypto {
        /// Human-readable context.
        message: String,
    },

    /// Serialization or parsing failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Human-readable context.
        message: String,
    },

    /// Channel not present in the secrets bundle.
    #[error("unknown channel: {message}")]
    UnknownChannel {
        /// Human-readable context.
        message: String,
    },

    /// Invalid range or out-of-domain timestamp.
    #[error("range error: {message}")]
    Range {
        /// Human-readable context.
        message: String,
    },

    /// Minimum cover exceeded the deployment-fixed slot count.
    #[error("cover too large: {message}")]
    CoverTooLarge {
        /// Human-readable context.
        message: String,
    },

    /// Timestamp not spanned by any node in a subscription cover.
    #[error("not covered: {message}")]
    NotCovered {
        /// Human-readable context.
        message: String,
    },

    /// Timestamp was not strictly greater than the last accepted one.
    #[error("replay rejected: {message}")]
    Replay {
        /// Human-readable context.
        message: String,
    },
}

impl SatError {
    /// Construct a [`SatError::Crypto`].
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Construct a [`SatError::Serialization`].
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Construct a [`SatError::UnknownChannel`].
    pub fn unknown_channel(message: impl Into<String>) -> Self {
        Self::UnknownChannel {
            message: message.into(),
        }
    }

    /// Construct a [`SatError::Range`].
    pub fn range(message: impl Into<String>) -> Self {
        Self::Range {
            message: message.into(),
        }
    }

    /// Construct a [`SatError::CoverTooLarge`].
    pub fn cover_too_large(message: impl Into<String>) -> Self {
        Self::CoverTooLarge {
            message: message.into(),
        }
    }

    /// Construct a [`SatError::NotCovered`].
    pub fn not_covered(message: impl Into<String>) -> Self {
        Self::NotCovered {
            message: message.into(),
        }
    }

    /// Construct a [`SatError::Replay`].
    pub fn replay(message: impl Into<String>) -> Self {
        Self::Replay {
            message: message.into(),
        }
    }

    /// The error kind, for structured logging and dispatch.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Crypto { .. } => ErrorKind::Crypto,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::UnknownChannel { .. } => ErrorKind::UnknownChannel,
            Self::Range { .. } => ErrorKind::Range,
            Self::CoverTooLarge { .. } => ErrorKind::CoverTooLarge,
            Self::NotCovered { .. } => ErrorKind::NotCovered,
            Self::Replay { .. } => ErrorKind::Replay,
        }
    }

    /// The error category as a stable string, for `tracing` fields.
    pub fn category(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Crypto => "crypto",
            ErrorKind::Serialization => "serialization",
            ErrorKind::UnknownChannel => "unknown_channel",
            ErrorKind::Range => "range",
            ErrorKind::CoverTooLarge => "cover_too_large",
            ErrorKind::NotCovered => "not_covered",
            ErrorKind::Replay => "replay",
        }
    }
}

/// Standard result type for satctl operations.
pub type Result<T> = std::result::Result<T, SatError>;

impl From<serde_json::Error> for SatError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for SatError {
    fn from(err: std::io::Error) -> Self {
        Self::serialization(format!("i/o error: {err}"))
    }
}

impl From<hex::FromHexError> for SatError {
    fn from(err: hex::FromHexError) -> Self {
        Self::serialization(format!("hex decoding error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation_and_category() {
        let err = SatError::unknown_channel("channel 7 not present");
        assert!(matches!(err, SatError::UnknownChannel { .. }));
        assert_eq!(err.category(), "unknown_channel");
        assert_eq!(err.to_string(), "unknown channel: channel 7 not present");
    }

    #[test]
    fn io_error_converts_to_serialization() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "secrets.json missing");
        let err = SatError::from(io_err);
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
