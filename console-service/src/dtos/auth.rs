use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Session;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    #[schema(example = "hunter2secret", min_length = 6)]
    pub password: String,

    #[validate(length(min = 1, message = "Full name is required"))]
    #[schema(example = "Jane Doe")]
    pub display_name: String,

    /// Invitation token carried on the signup link.
    #[schema(example = "3f1c9a2b8d4e5f60718293a4b5c6d7e8")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "550e8400e29b41d4a716446655440000")]
    pub pending_uid: String,
    #[schema(
        example = "Your registration is pending approval. You will be notified once an admin grants you access."
    )]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "admin@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "hunter2secret")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    #[schema(example = "550e8400e29b41d4a716446655440000")]
    pub uid: String,
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub display_name: String,
    #[schema(example = "admin")]
    pub role: String,
    #[schema(example = "session-token-123")]
    pub token: String,
    /// True when this sign-in committed a verified email change.
    #[schema(example = false)]
    pub email_change_committed: bool,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            uid: s.uid,
            email: s.email,
            display_name: s.display_name,
            role: s.role,
            token: s.token,
            email_change_committed: s.email_change_committed,
        }
    }
}
