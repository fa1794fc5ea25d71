//! Cryptographic primitives used by the channel key tree, subscription
//! builder, and frame encoder.
//!
//! Everything here is a pure function of its inputs except [`RandBytes`],
//! which consumes an injectable RNG so tests can seed it deterministically
//! instead of reaching for a global source of randomness.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hkdf::Hkdf;
use md5::{Digest, Md5};
use sha2::Sha512;

use sat_core::{Result, SatError};

/// A 128-bit tree node key.
pub type NodeKey = [u8; 16];

/// A 256-bit ChaCha20 key.
pub type StreamKey = [u8; 32];

/// Left-branch domain separation byte, appended before hashing.
const LEFT_TAG: u8 = b'L';
/// Right-branch domain separation byte, appended before hashing.
const RIGHT_TAG: u8 = b'R';

/// `PRF_L(k) = MD5(k || 'L')` — the left-child tree derivation step.
pub fn prf_l(key: &NodeKey) -> NodeKey {
    prf(key, LEFT_TAG)
}

/// `PRF_R(k) = MD5(k || 'R')` — the right-child tree derivation step.
pub fn prf_r(key: &NodeKey) -> NodeKey {
    prf(key, RIGHT_TAG)
}

fn prf(key: &NodeKey, tag: u8) -> NodeKey {
    let mut hasher = Md5::new();
    hasher.update(key);
    hasher.update([tag]);
    let digest = hasher.finalize();
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest);
    out
}

/// `extend16to32(k) = k || MD5(k)` — widens a 128-bit leaf key to the
/// 256-bit key ChaCha20 requires.
pub fn extend16to32(key: &NodeKey) -> StreamKey {
    let digest = Md5::digest(key);
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(key);
    out[16..].copy_from_slice(&digest);
    out
}

/// `derive_device_key(decoder_master, decoder_id) = HKDF(SHA-512,
/// ikm=decoder_master, salt=empty, info=LE32(decoder_id), L=32)`.
pub fn derive_device_key(decoder_master: &[u8; 32], decoder_id: u32) -> StreamKey {
    let hkdf = Hkdf::<Sha512>::new(None, decoder_master);
    let mut out = [0u8; 32];
    hkdf.expand(&decoder_id.to_le_bytes(), &mut out)
        .expect("32-byte okm is within HKDF-SHA512's output limit");
    out
}

/// `StreamEncrypt(k256, nonce12, plaintext)` — length-preserving ChaCha20
/// keystream application. Symmetric: calling this again on the output with
/// the same key and nonce recovers the input.
pub fn stream_apply(key: &StreamKey, nonce: &[u8; 12], data: &mut [u8]) {
    use chacha20::cipher::{KeyIvInit, StreamCipher};
    use chacha20::ChaCha20;

    let mut cipher = ChaCha20::new(key.into(), nonce.into());
    cipher.apply_keystream(data);
}

/// Sign `message` with the host's Ed25519 key.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> [u8; 64] {
    signing_key.sign(message).to_bytes()
}

/// Verify an Ed25519 signature over `message` against `signature`.
pub fn verify(
    verifying_key: &VerifyingKey,
    message: &[u8],
    signature: &[u8; 64],
) -> Result<()> {
    let sig = Signature::from_bytes(signature);
    verifying_key
        .verify(message, &sig)
        .map_err(|e| SatError::crypto(format!("signature verification failed: {e}")))
}

/// An injectable source of cryptographically secure randomness.
///
/// Production callers (the `sat-cli` binary) pass `rand::rngs::OsRng`;
/// this crate's own tests pass a seeded `rand_chacha::ChaCha20Rng` for
/// reproducibility. Any `rand_core::RngCore` implementation satisfies
/// this automatically — `sat-crypto` depends only on `rand_core`, never
/// on `rand` itself, outside of `dev-dependencies`.
pub trait SecureRandom {
    /// Fill `buf` with random bytes.
    fn fill(&mut self, buf: &mut [u8]);
}

impl<T: rand_core::RngCore> SecureRandom for T {
    fn fill(&mut self, buf: &mut [u8]) {
        self.fill_bytes(buf);
    }
}

/// Draw `n` cryptographically random bytes from `rng`.
pub fn rand_bytes(rng: &mut impl SecureRandom, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rng.fill(&mut buf);
    buf
}

/// Draw a random 12-byte nonce.
pub fn rand_nonce12(rng: &mut impl SecureRandom) -> [u8; 12] {
    let mut buf = [0u8; 12];
    rng.fill(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prf_l_and_prf_r_are_distinct_and_deterministic() {
        let k = [7u8; 16];
        assert_eq!(prf_l(&k), prf_l(&k));
        assert_ne!(prf_l(&k), prf_r(&k));
    }

    #[test]
    fn extend16to32_prefixes_original_key() {
        let k = [3u8; 16];
        let extended = extend16to32(&k);
        assert_eq!(&extended[..16], &k[..]);
    }

    #[test]
    fn derive_device_key_is_deterministic_and_id_dependent() {
        let master = [9u8; 32];
        let a = derive_device_key(&master, 1);
        let b = derive_device_key(&master, 1);
        let c = derive_device_key(&master, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn stream_apply_is_an_involution() {
        let key = [1u8; 32];
        let nonce = [2u8; 12];
        let mut data = b"hello satellite".to_vec();
        let original = data.clone();
        stream_apply(&key, &nonce, &mut data);
        assert_ne!(data, original);
        stream_apply(&key, &nonce, &mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let signing_key = SigningKey::from_bytes(&[5u8; 32]);
        let verifying_key = signing_key.verifying_key();
        let message = b"subscription header bytes";

        let signature = sign(&signing_key, message);
        assert!(verify(&verifying_key, message, &signature).is_ok());

        let mut tampered = message.to_vec();
        tampered[0] ^= 1;
        assert!(verify(&verifying_key, &tampered, &signature).is_err());
    }
}
