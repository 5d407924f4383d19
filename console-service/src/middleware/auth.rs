use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::IntoResponse,
};
use console_core::error::AppError;

use crate::models::Session;
use crate::AppState;

/// Middleware for the authenticated surface.
///
/// Every request re-runs the access gate on the presented token, so role
/// enforcement (and the lazy email-change commit) happens on session
/// restore exactly as it does at sign-in.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Missing or invalid Authorization header"
            )));
        }
    };

    let session = state.gate.restore(token).await?;

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Extractor handing handlers the admitted session.
pub struct AuthUser(pub Session);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Session missing from request extensions"))
        })?;

        Ok(AuthUser(session.clone()))
    }
}
