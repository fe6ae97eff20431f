/**
 * Authentication Handler Types
 *
 * Request and response bodies of the `/api/auth` endpoints. Responses use
 * camelCase field names.
 */

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::users::User;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Canonical form of an email address for lookups and storage
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// First signup step
#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    /// Plain password, hashed before it is kept anywhere
    pub password: String,
    /// reCAPTCHA response token, when the client renders the widget
    #[serde(default)]
    pub grecaptcha: Option<String>,
}

impl SignupRequest {
    /// Field errors, empty when the request is acceptable
    pub fn validate(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        let email = self.email.trim();
        if email.is_empty() {
            fields.insert("email".to_string(), "Email is required".to_string());
        } else if !email.contains('@') {
            fields.insert("email".to_string(), "Email is invalid".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            fields.insert(
                "password".to_string(),
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        if matches!(self.grecaptcha.as_deref(), Some(token) if token.trim().is_empty()) {
            fields.insert("grecaptcha".to_string(), "reCAPTCHA is required".to_string());
        }
        fields
    }
}

/// Second signup step
#[derive(Deserialize, Serialize, Debug)]
pub struct VerifyRequest {
    pub code: u32,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Reply to the first signup step
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub status_code: u16,
    pub message: String,
}

/// Returned by verify and login
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    /// JWT for the `Authorization: Bearer` header or the `token` query parameter
    pub access_token: String,
}

/// User information that is safe to return to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub access: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            access: user.access,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            avatar: user.avatar,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, grecaptcha: Option<&str>) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            password: password.into(),
            grecaptcha: grecaptcha.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_valid_signup_has_no_field_errors() {
        assert!(request("a@example.com", "long enough", None).validate().is_empty());
        assert!(request("a@example.com", "long enough", Some("token")).validate().is_empty());
    }

    #[test]
    fn test_signup_field_errors() {
        let fields = request("nope", "short", Some(" ")).validate();
        assert_eq!(
            fields.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["email", "grecaptcha", "password"]
        );
        assert_eq!(request("", "long enough", None).validate()["email"], "Email is required");
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            password_hash: "$2b$secret".into(),
            access: "USER".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            phone: None,
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
