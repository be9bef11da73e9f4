//! Cryptographic primitives shared across the crate: a base64-SHA-256
//! digest type, and public/private keys and signatures backed by secp256k1
//! ECDSA.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secp256k1::{Message, PublicKey as Secp256k1PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A base64-encoded SHA-256 digest, as produced by [`crate::digest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Hashes `data` and encodes the result as base64.
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Digest(STANDARD.encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A public key, the canonical identifier for a [`crate::topology::Member`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        PublicKey(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn to_secp256k1(&self) -> Result<Secp256k1PublicKey, CryptoError> {
        let bytes = STANDARD
            .decode(&self.0)
            .map_err(|e| CryptoError::InvalidFormat(e.to_string()))?;
        Secp256k1PublicKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidFormat(e.to_string()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A private key. Only the in-memory test [`Signer`](crate::capability::Signer)
/// implementation needs this; the core never constructs one.
#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    pub fn from_secp256k1(key: SecretKey) -> Self {
        PrivateKey(key)
    }

    pub fn public_key(&self) -> PublicKey {
        let secp = Secp256k1::new();
        let public = Secp256k1PublicKey::from_secret_key(&secp, &self.0);
        PublicKey(STANDARD.encode(public.serialize()))
    }

    /// Signs `digest` with this key, producing a base64-encoded ECDSA signature.
    pub fn sign(&self, digest: &Digest) -> SignatureValue {
        let message = Message::from_slice(&digest_to_message_bytes(digest))
            .expect("digest_to_message_bytes always yields 32 bytes");
        let compact = Secp256k1::signing_only()
            .sign_ecdsa(&message, &self.0)
            .serialize_compact();
        SignatureValue(STANDARD.encode(compact))
    }
}

/// A signature value: base64-encoded ECDSA signature bytes over a [`Digest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureValue(String);

impl SignatureValue {
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        SignatureValue(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verifies this signature against `digest` under `public_key`.
    pub fn verify(&self, digest: &Digest, public_key: &PublicKey) -> Result<bool, CryptoError> {
        let bytes = STANDARD
            .decode(&self.0)
            .map_err(|e| CryptoError::InvalidFormat(e.to_string()))?;
        let signature = secp256k1::ecdsa::Signature::from_compact(&bytes)
            .map_err(|e| CryptoError::InvalidFormat(e.to_string()))?;
        let public_key = public_key.to_secp256k1()?;
        let message = Message::from_slice(&digest_to_message_bytes(digest))
            .expect("digest_to_message_bytes always yields 32 bytes");
        Ok(Secp256k1::verification_only()
            .verify_ecdsa(&message, &signature, &public_key)
            .is_ok())
    }
}

/// secp256k1 messages must be exactly 32 bytes; a base64-SHA-256 string is
/// not, so we hash it once more to fit the curve's message space.
fn digest_to_message_bytes(digest: &Digest) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(digest.as_str().as_bytes());
    hasher.finalize().into()
}

/// Generates a new keypair deterministically from `seed`.
pub fn generate_keypair(seed: impl AsRef<[u8]>) -> (PublicKey, PrivateKey) {
    use secp256k1::rand::SeedableRng;
    let mut hasher = Sha256::new();
    hasher.update(seed);
    let seed_bytes: [u8; 32] = hasher.finalize().into();
    let mut rng = secp256k1::rand::rngs::StdRng::from_seed(seed_bytes);
    let secp = Secp256k1::new();
    let (secret, _) = secp.generate_keypair(&mut rng);
    let private_key = PrivateKey(secret);
    let public_key = private_key.public_key();
    (public_key, private_key)
}
