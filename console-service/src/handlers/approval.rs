//! Approval handlers: review, approve, and reject registrations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use console_core::error::AppError;

use crate::dtos::admin::{ApproveRequest, PendingRegistrationResponse};
use crate::AppState;

/// List applications awaiting review, newest first.
///
/// GET /admin/registrations
#[tracing::instrument(skip_all)]
pub async fn list_pending(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let pending = state.approval.list_pending().await?;

    let rows: Vec<PendingRegistrationResponse> = pending
        .into_iter()
        .map(PendingRegistrationResponse::from)
        .collect();

    Ok(Json(rows))
}

/// Approve an application: the account becomes an administrator and the
/// pending row is removed.
///
/// POST /admin/registrations/{id}/approve
#[tracing::instrument(skip(state), fields(pending_id = %id, uid = %req.uid))]
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ApproveRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.approval.approve(&req.uid, &id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "User approved successfully."
        })),
    ))
}

/// Reject an application: the pending row is removed and nothing else is
/// touched.
///
/// POST /admin/registrations/{id}/reject
#[tracing::instrument(skip(state), fields(pending_id = %id))]
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.approval.reject(&id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "User rejected successfully."
        })),
    ))
}
