pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::SecurityScheme,
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ConsoleConfig;
use crate::services::{
    AccessGate, AccountService, ApprovalService, DirectoryService, DocumentStore,
    EmailChangeService, IdentityProvider, InvitationService, RegistrationService,
};
use console_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::session,
    ),
    components(
        schemas(
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::LoginRequest,
            dtos::auth::SessionResponse,
            dtos::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, sign-in, and session management"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: ConsoleConfig,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub invitations: InvitationService,
    pub registration: RegistrationService,
    pub approval: ApprovalService,
    pub gate: AccessGate,
    pub email_change: EmailChangeService,
    pub accounts: AccountService,
    pub directory: DirectoryService,
}

impl AppState {
    /// Wire the full service graph over the given collaborators.
    pub fn new(
        config: ConsoleConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let invitations = InvitationService::new(store.clone(), &config.invites);
        let registration =
            RegistrationService::new(store.clone(), identity.clone(), invitations.clone());
        let approval = ApprovalService::new(store.clone());
        let gate = AccessGate::new(store.clone(), identity.clone());
        let email_change = EmailChangeService::new(store.clone(), identity.clone());
        let accounts = AccountService::new(store.clone(), identity.clone());
        let directory = DirectoryService::new(store.clone());

        Self {
            config,
            store,
            identity,
            invitations,
            registration,
            approval,
            gate,
            email_change,
            accounts,
            directory,
        }
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Everything behind the gate; the middleware re-evaluates the session
    // on each request.
    let authenticated_routes = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/session", get(handlers::auth::session))
        .route(
            "/admin/invitations",
            post(handlers::invitation::create_invitation),
        )
        .route("/admin/registrations", get(handlers::approval::list_pending))
        .route(
            "/admin/registrations/:id/approve",
            post(handlers::approval::approve),
        )
        .route(
            "/admin/registrations/:id/reject",
            post(handlers::approval::reject),
        )
        .route("/admin/users", get(handlers::directory::list_users))
        .route("/admin/users/:uid", delete(handlers::directory::delete_user))
        .route("/admin/dashboard", get(handlers::directory::dashboard))
        .route("/admin/stores", get(handlers::directory::list_stores))
        .route(
            "/admin/stores/:id",
            patch(handlers::directory::update_store).delete(handlers::directory::delete_store),
        )
        .route("/account/email", post(handlers::account::change_email))
        .route("/account/password", post(handlers::account::change_password))
        .route("/account/profile", patch(handlers::account::update_profile))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new().route("/health", get(health_check));

    let swagger_enabled = match state.config.environment {
        config::Environment::Dev => true,
        config::Environment::Prod => state.config.swagger.enabled == config::SwaggerMode::Public,
    };

    if swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .merge(authenticated_routes)
        .with_state(state.clone())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Document store health check failed");
        AppError::InternalError(e)
    })?;

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up"
        }
    })))
}
