use std::sync::Arc;

use super::{
    claims::Claims,
    jwt::{JwtKeys, TokenError},
};

/// Allow/deny decision for protected operations. Which operations are
/// protected is decided by the router, not here.
#[derive(Clone)]
pub struct AuthorizationGate {
    keys: Arc<JwtKeys>,
}

impl AuthorizationGate {
    pub fn new(keys: Arc<JwtKeys>) -> Self {
        Self { keys }
    }

    /// Accepts exactly `Bearer <token>` (scheme case-insensitive).
    pub fn check(&self, authorization: Option<&str>) -> Result<Claims, TokenError> {
        let token = bearer_token(authorization.unwrap_or_default())
            .ok_or(TokenError::Unauthenticated)?;
        self.keys.verify(token)
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}
