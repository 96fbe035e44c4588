use anyhow::Context;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::{claims::Claims, dto::Identity};
use crate::config::{JwtConfig, SigningMaterial};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("missing or malformed authorization header")]
    Unauthenticated,
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("could not issue token: {0}")]
    Issue(String),
}

/// Signing and verification material, loaded once at startup.
pub struct JwtKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> anyhow::Result<Self> {
        let (algorithm, encoding, decoding) = match &cfg.signing {
            SigningMaterial::RsaPem {
                private_key_path,
                public_key_path,
            } => {
                let private_pem = std::fs::read(private_key_path)
                    .with_context(|| format!("read {}", private_key_path.display()))?;
                let public_pem = std::fs::read(public_key_path)
                    .with_context(|| format!("read {}", public_key_path.display()))?;
                (
                    Algorithm::RS256,
                    EncodingKey::from_rsa_pem(&private_pem).context("parse RSA private key")?,
                    DecodingKey::from_rsa_pem(&public_pem).context("parse RSA public key")?,
                )
            }
            SigningMaterial::Secret(secret) => (
                Algorithm::HS256,
                EncodingKey::from_secret(secret.as_bytes()),
                DecodingKey::from_secret(secret.as_bytes()),
            ),
        };
        Ok(Self {
            algorithm,
            encoding,
            decoding,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        })
    }

    /// Validity window used for login tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: &Identity, validity: Duration) -> Result<String, TokenError> {
        self.issue_at(identity, OffsetDateTime::now_utc(), validity)
    }

    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        now: OffsetDateTime,
        validity: Duration,
    ) -> Result<String, TokenError> {
        // An already-expired token is never handed out; failed logins get no token at all.
        if !validity.is_positive() {
            return Err(TokenError::Issue(format!(
                "validity must be positive, got {validity}"
            )));
        }
        let exp = now + validity;
        let claims = Claims {
            sub: identity.username.clone(),
            id: identity.id,
            name: identity.display_name(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| TokenError::Issue(e.to_string()))?;
        debug!(user_id = %identity.id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    pub(crate) fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        // Only the configured algorithm is accepted.
        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        // Expiry is checked below against `now`, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(error = %e, "jwt rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.exp <= now.unix_timestamp() {
            debug!(user_id = %data.claims.id, exp = data.claims.exp, "jwt expired");
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) fn test_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
    JwtKeys::from_config(&JwtConfig {
        signing: SigningMaterial::Secret(secret.into()),
        issuer: issuer.into(),
        audience: audience.into(),
        ttl_minutes: 360,
    })
    .expect("secret keys always load")
}
