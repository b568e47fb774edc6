//! Bundle signing
//!
//! A bundle's signature covers [`crate::ArchiveBundle::signing_payload`].
//! [`ContentHashSigner`] only proves integrity: anyone can recompute a
//! content hash. [`HmacBundleSigner`] authenticates bundles between sites
//! that share a key.

use crate::domain::{FederationError, FederationResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared_types::ContentHash;

type HmacSha256 = Hmac<Sha256>;

pub trait BundleSigner: Send + Sync {
    fn sign(&self, payload: &[u8]) -> FederationResult<String>;
}

pub trait BundleVerifier: Send + Sync {
    fn verify(&self, payload: &[u8], signature: &str) -> bool;
}

/// Signature is the hex SHA-256 of the payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHashSigner;

impl BundleSigner for ContentHashSigner {
    fn sign(&self, payload: &[u8]) -> FederationResult<String> {
        Ok(ContentHash::digest(payload).to_hex())
    }
}

impl BundleVerifier for ContentHashSigner {
    fn verify(&self, payload: &[u8], signature: &str) -> bool {
        ContentHash::digest(payload).to_hex() == signature
    }
}

/// HMAC-SHA256 over the payload with a key shared by both sites.
#[derive(Clone)]
pub struct HmacBundleSigner {
    key: Vec<u8>,
}

impl HmacBundleSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    fn mac(&self) -> FederationResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| FederationError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for HmacBundleSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacBundleSigner").finish_non_exhaustive()
    }
}

impl BundleSigner for HmacBundleSigner {
    fn sign(&self, payload: &[u8]) -> FederationResult<String> {
        let mut mac = self.mac()?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl BundleVerifier for HmacBundleSigner {
    fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = self.mac() else {
            return false;
        };
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    }
}
