//! Per-flow secrets for the interactive authorization
//!
//! Both values are generated fresh for every flow and dropped once the code
//! exchange finishes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random input fed to the state hash
const STATE_ENTROPY_BYTES: usize = 1024;

/// 32 random bytes encode to a 43 character verifier, the RFC 7636 minimum
const VERIFIER_ENTROPY_BYTES: usize = 32;

/// Anti-forgery token echoed back by the authorization server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationState(String);

impl AuthorizationState {
    /// SHA-256 over fresh random bytes, lowercase hex (64 characters)
    pub fn generate() -> Self {
        let mut entropy = vec![0u8; STATE_ENTROPY_BYTES];
        rand::thread_rng().fill_bytes(&mut entropy);

        let digest = Sha256::digest(&entropy);
        Self(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// PKCE verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let mut entropy = [0u8; VERIFIER_ENTROPY_BYTES];
        rand::thread_rng().fill_bytes(&mut entropy);

        let verifier = URL_SAFE_NO_PAD.encode(entropy);
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self { verifier, challenge }
    }
}
