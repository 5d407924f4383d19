//! Invitation handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use console_core::error::AppError;

use crate::dtos::admin::InviteLinkResponse;
use crate::AppState;

/// Issue a registration link for a prospective administrator.
///
/// POST /admin/invitations
#[tracing::instrument(skip_all)]
pub async fn create_invitation(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let invite = state.invitations.issue().await?;

    Ok((
        StatusCode::CREATED,
        Json(InviteLinkResponse {
            token: invite.token,
            signup_url: invite.signup_url,
            expires_at: invite.expires_at,
        }),
    ))
}
