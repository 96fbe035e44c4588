use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user, stripped of any password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
}

impl Identity {
    pub fn display_name(&self) -> String {
        [self.firstname.as_str(), self.lastname.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct AuthToken {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_skips_blank_parts() {
        let mut who = Identity {
            id: Uuid::new_v4(),
            username: "admin".into(),
            firstname: "Administrator".into(),
            lastname: String::new(),
        };
        assert_eq!(who.display_name(), "Administrator");
        who.lastname = "Root".into();
        assert_eq!(who.display_name(), "Administrator Root");
    }

    #[test]
    fn identity_serializes_without_password() {
        let who = Identity {
            id: Uuid::new_v4(),
            username: "alice".into(),
            firstname: "Alice".into(),
            lastname: "Liddell".into(),
        };
        let json = serde_json::to_string(&who).unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("password"));
    }
}
