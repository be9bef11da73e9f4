use async_trait::async_trait;
use concord_core::{CapabilityError, Hash as Digest, PrivateKey, PublicKey, Signer, SignatureValue};

/// An in-memory [`Signer`] scoped to one node's participation in one
/// session. Per DESIGN.md Open Question 3, `sessionCode → key` derivation
/// is host-defined; this implementation derives the per-session key
/// deterministically from `(node_seed, session_code)` at construction
/// time, so `get_our_key` is a pure lookup and `sign`/`verify` need no
/// session parameter of their own.
pub struct MemorySigner {
    session_code: String,
    public_key: PublicKey,
    private_key: PrivateKey,
}

impl MemorySigner {
    pub fn for_session(node_seed: &str, session_code: &str) -> Self {
        let seed = format!("{node_seed}:{session_code}");
        let (public_key, private_key) = concord_core::crypto::generate_keypair(seed);
        MemorySigner {
            session_code: session_code.to_string(),
            public_key,
            private_key,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key.clone()
    }
}

#[async_trait]
impl Signer for MemorySigner {
    async fn get_our_key(&self, session_code: &str) -> Result<PublicKey, CapabilityError> {
        if session_code != self.session_code {
            return Err(CapabilityError::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "signer is scoped to a different session",
            )));
        }
        Ok(self.public_key.clone())
    }

    async fn sign(&self, digest: &Digest) -> Result<SignatureValue, CapabilityError> {
        Ok(self.private_key.sign(digest))
    }

    async fn verify(
        &self,
        key: &PublicKey,
        digest: &Digest,
        value: &SignatureValue,
    ) -> Result<bool, CapabilityError> {
        value
            .verify(digest, key)
            .map_err(|e| CapabilityError::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())))
    }
}
