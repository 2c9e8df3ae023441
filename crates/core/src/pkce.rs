//! PKCE verifier and S256 challenge

use crate::error::{SessionError, SessionResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Random bytes behind a verifier; encodes to 43 characters
const VERIFIER_BYTES: usize = 32;

/// Generate a fresh code verifier (RFC 7636, base64url without padding)
pub fn generate_code_verifier() -> SessionResult<String> {
    let mut bytes = [0u8; VERIFIER_BYTES];
    getrandom::fill(&mut bytes)
        .map_err(|e| SessionError::Internal(format!("No randomness for PKCE verifier: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// `BASE64URL(SHA256(verifier))`
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
