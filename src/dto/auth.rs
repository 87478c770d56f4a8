use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::User;

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 4, max = 20, message = "Username must be 4 to 20 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm_password: String,
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Describes a form so clients can render it and pre-validate input.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormDescriptor {
    pub action: &'static str,
    pub submit: &'static str,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    pub required: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
}

impl FormField {
    fn new(name: &'static str, label: &'static str, kind: &'static str) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            min_length: None,
            max_length: None,
        }
    }

    fn length(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }
}

impl FormDescriptor {
    pub fn login() -> Self {
        Self {
            action: "/login",
            submit: "Sign In",
            fields: vec![
                FormField::new("email", "Email", "email"),
                FormField::new("password", "Password", "password"),
            ],
        }
    }

    pub fn register() -> Self {
        Self {
            action: "/register",
            submit: "Create Account",
            fields: vec![
                FormField::new("username", "Username", "text").length(Some(4), Some(20)),
                FormField::new("email", "Email", "email"),
                FormField::new("password", "Password", "password").length(Some(6), None),
                FormField::new("confirm_password", "Confirm Password", "password"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(register("ferris", "ferris@example.com", "crab123", "crab123")
            .validate()
            .is_ok());
    }

    #[test]
    fn registration_rules_are_enforced() {
        let errors = register("abc", "not-an-email", "short", "other")
            .validate()
            .expect_err("every field is invalid");
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("confirm_password"));
    }

    #[test]
    fn username_longer_than_twenty_is_rejected() {
        let long = "a".repeat(21);
        assert!(register(&long, "a@example.com", "secret1", "secret1")
            .validate()
            .is_err());
    }
}
