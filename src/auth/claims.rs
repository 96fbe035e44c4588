use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload issued on successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // username
    pub id: Uuid,     // user ID
    pub name: String, // "firstname lastname"
    pub iat: i64,     // issued at (unix timestamp)
    pub exp: i64,     // expires at (unix timestamp)
    pub iss: String,  // issuer
    pub aud: String,  // audience
}
