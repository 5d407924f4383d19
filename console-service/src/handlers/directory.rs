//! Directory, dashboard, and store-listing handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use console_core::error::AppError;

use crate::dtos::admin::{
    DashboardResponse, DirectoryResponse, StoreResponse, UpdateStoreRequest, UserAccountResponse,
};
use crate::utils::ValidatedJson;
use crate::AppState;

/// GET /admin/users
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (admins, users) = state.directory.list_accounts().await?;

    Ok(Json(DirectoryResponse {
        admins: admins.into_iter().map(UserAccountResponse::from).collect(),
        users: users.into_iter().map(UserAccountResponse::from).collect(),
    }))
}

/// DELETE /admin/users/{uid}
#[tracing::instrument(skip(state), fields(uid = %uid))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.directory.delete_account(&uid).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "User deleted successfully."
        })),
    ))
}

/// GET /admin/dashboard
#[tracing::instrument(skip_all)]
pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let counts = state.directory.counts().await?;

    Ok(Json(DashboardResponse {
        users: counts.users,
        admins: counts.admins,
        stores: counts.stores,
    }))
}

/// GET /admin/stores
#[tracing::instrument(skip_all)]
pub async fn list_stores(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stores = state.directory.list_stores().await?;

    let rows: Vec<StoreResponse> = stores.into_iter().map(StoreResponse::from).collect();
    Ok(Json(rows))
}

/// PATCH /admin/stores/{id}
#[tracing::instrument(skip(state, req), fields(store_id = %id))]
pub async fn update_store(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateStoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .directory
        .update_store(&id, &req.store_name, &req.opening_time, &req.closing_time)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Store updated successfully."
        })),
    ))
}

/// DELETE /admin/stores/{id}
#[tracing::instrument(skip(state), fields(store_id = %id))]
pub async fn delete_store(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.directory.delete_store(&id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Store deleted successfully."
        })),
    ))
}
