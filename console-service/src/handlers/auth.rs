use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use console_core::error::AppError;

use crate::{
    dtos::{
        auth::{LoginRequest, RegisterRequest, RegisterResponse, SessionResponse},
        ErrorResponse,
    },
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Register with an invitation token
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Application submitted and pending approval", body = RegisterResponse),
        (status = 400, description = "Missing, invalid, expired, or already used token", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pending_uid = state
        .registration
        .register(
            &req.email,
            &req.password,
            &req.display_name,
            req.token.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            pending_uid,
            message: "Your registration is pending approval. You will be notified once an admin \
                      grants you access."
                .to_string(),
        }),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Pending approval or not an administrator", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.gate.login(&req.email, &req.password).await?;
    Ok((StatusCode::OK, Json(SessionResponse::from(session))))
}

/// Sign the current session out
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out successfully"),
        (status = 401, description = "Invalid session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state.gate.logout(&user.0.token).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Logged out successfully"
        })),
    ))
}

/// Current session, re-evaluated through the access gate
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session is valid", body = SessionResponse),
        (status = 401, description = "Invalid session", body = ErrorResponse),
        (status = 403, description = "Role rejected; session destroyed", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn session(user: AuthUser) -> impl IntoResponse {
    Json(SessionResponse::from(user.0))
}
