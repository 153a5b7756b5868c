//! PKCE (Proof Key for Code Exchange) and CSRF state-token generation
//!
//! Implements RFC 7636 for platforms that bind authorization codes to a
//! client-generated secret (Twitter, LinkedIn). Also provides the random
//! state tokens used for CSRF protection on every platform.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure code verifier.
///
/// Returns a URL-safe base64-encoded random string of 32 bytes (43
/// characters). Per RFC 7636, verifiers must be 43-128 characters long.
#[must_use]
pub fn generate_code_verifier() -> String {
    random_token()
}

/// Generate a code challenge from a verifier using SHA256.
///
/// Per RFC 7636, the challenge is `BASE64URL(SHA256(ASCII(code_verifier)))`.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate a random state token for CSRF protection.
///
/// Returns a URL-safe base64-encoded random string of 32 bytes.
#[must_use]
pub fn generate_state_token() -> String {
    random_token()
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// PKCE verifier/challenge pair for one authorization round-trip.
///
/// The verifier is kept secret (persisted with the CSRF state) until token
/// exchange; the challenge goes into the authorization URL.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkceChallenge {
    /// Generate a new challenge pair with cryptographically secure random
    /// values.
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge }
    }

    /// The challenge method (always "S256").
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        "S256"
    }
}
