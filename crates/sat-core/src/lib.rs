//! Shared error type and deployment constants for the satctl keying core.
//!
//! This crate has no cryptographic dependencies of its own: it exists so
//! `sat-crypto` (pure, synchronous) and `sat-cli` (file I/O, logging) can
//! share one error vocabulary without the crypto crate depending on the
//! CLI's concerns or vice versa.

pub mod constants;
mod error;

pub use error::{ErrorKind, Result, SatError};
