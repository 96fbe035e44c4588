use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use super::repo_types::{NewUser, UserChanges};
use crate::error::AppError;

const MAX_NAME_LEN: usize = 48;

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.@-]{1,48}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

fn check_name(field: &str, value: &str) -> Result<(), AppError> {
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn check_username(username: &str) -> Result<(), AppError> {
    if !is_valid_username(username) {
        return Err(AppError::BadRequest("invalid username".into()));
    }
    Ok(())
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let username = self.username.trim().to_string();
        check_username(&username)?;
        check_name("firstname", &self.firstname)?;
        check_name("lastname", &self.lastname)?;
        if self.password.is_empty() {
            return Err(AppError::BadRequest("password cannot be blank".into()));
        }
        Ok(NewUser {
            firstname: self.firstname.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            username,
            password: self.password,
        })
    }
}

/// Request body for `PUT /user`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub id: Uuid,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<(Uuid, UserChanges), AppError> {
        let username = self.username.map(|u| u.trim().to_string());
        if let Some(u) = &username {
            check_username(u)?;
        }
        if let Some(f) = &self.firstname {
            check_name("firstname", f)?;
        }
        if let Some(l) = &self.lastname {
            check_name("lastname", l)?;
        }
        if self.password.as_deref() == Some("") {
            return Err(AppError::BadRequest("password cannot be blank".into()));
        }
        Ok((
            self.id,
            UserChanges {
                firstname: self.firstname.map(|f| f.trim().to_string()),
                lastname: self.lastname.map(|l| l.trim().to_string()),
                username,
                password: self.password,
            },
        ))
    }
}

/// Request body for `DELETE /user`.
#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("a.l-i_c@e"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username(&"x".repeat(49)));
    }

    #[test]
    fn register_requires_password() {
        let req = RegisterRequest {
            firstname: String::new(),
            lastname: String::new(),
            username: "alice".into(),
            password: String::new(),
        };
        assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn register_trims_username() {
        let req = RegisterRequest {
            firstname: " Alice ".into(),
            lastname: "Liddell".into(),
            username: "  alice ".into(),
            password: "s3cret".into(),
        };
        let user = req.validate().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.firstname, "Alice");
        assert_eq!(user.password, "s3cret");
    }

    #[test]
    fn update_rejects_blank_password_and_long_names() {
        let req = UpdateUserRequest {
            id: Uuid::new_v4(),
            firstname: None,
            lastname: None,
            username: None,
            password: Some(String::new()),
        };
        assert!(req.validate().is_err());

        let req = UpdateUserRequest {
            id: Uuid::new_v4(),
            firstname: Some("y".repeat(49)),
            lastname: None,
            username: None,
            password: None,
        };
        assert!(req.validate().is_err());
    }
}
