//! Account settings handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use console_core::error::AppError;

use crate::dtos::account::{ChangeEmailRequest, ChangePasswordRequest, UpdateProfileRequest};
use crate::middleware::AuthUser;
use crate::utils::ValidatedJson;
use crate::AppState;

/// File an email-change intent; the authoritative email changes only after
/// the verification link is used and the next sign-in observes it.
///
/// POST /account/email
#[tracing::instrument(skip_all)]
pub async fn change_email(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangeEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .email_change
        .request_change(&user.0, &req.new_email, &req.current_password)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Verification email sent. Your email will be updated once you confirm \
                        the new address and sign in again."
        })),
    ))
}

/// POST /account/password
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .accounts
        .change_password(&user.0, &req.current_password, &req.new_password)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Password updated successfully."
        })),
    ))
}

/// PATCH /account/profile
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .accounts
        .update_display_name(&user.0, &req.display_name)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Username updated successfully."
        })),
    ))
}
