//! Admin credential verification.

use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Verifies the credential presented with a catalog-mutating request.
///
/// The trait keeps the trust decision pluggable; the shipped
/// implementation is a single process-wide shared secret.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> bool;
}

/// Static shared-secret verifier.
///
/// Comparison is constant-time. The pass/fail contract is unchanged from
/// plain equality; this only closes the timing side-channel.
pub struct StaticTokenVerifier {
    token: String,
}

impl StaticTokenVerifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialVerifier for StaticTokenVerifier {
    fn verify(&self, credential: &str) -> bool {
        self.token.as_bytes().ct_eq(credential.as_bytes()).into()
    }
}

/// Extracts the token from a `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Rejects the request unless it carries a valid admin credential.
/// Called before any request body is consumed, so a failed check never
/// touches storage.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    if !state.verifier.verify(token) {
        return Err(AppError::Unauthorized("Invalid admin token".to_string()));
    }
    Ok(())
}
