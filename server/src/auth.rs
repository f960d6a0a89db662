use axum::http::HeaderMap;

use crate::error::ApiError;

/// Verified caller identity. The uid is trusted downstream as the
/// billing and ownership key.
#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

/// Seam to the identity provider: bearer token in, identity out.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<Identity>;
}

/// Development verifier: the bearer token is taken as the uid itself.
/// A real deployment substitutes a verifier backed by the identity
/// provider's token validation.
pub struct StaticTokenVerifier;

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<Identity> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Identity {
            uid: token.to_string(),
            email: None,
        })
    }
}

/// Authenticate a request from its headers. Everything else in the
/// pipeline runs after this check.
pub fn authenticate(
    verifier: &dyn TokenVerifier,
    headers: &HeaderMap,
) -> Result<Identity, ApiError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    verifier.verify(token).ok_or(ApiError::Unauthenticated)
}
