use console_core::error::AppError;
use thiserror::Error;

use crate::services::identity::IdentityError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Store(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Registration token is missing")]
    MissingToken,

    #[error("Invalid registration token")]
    InvalidToken,

    #[error("Registration token has expired")]
    TokenExpired,

    #[error("Registration token has already been used")]
    TokenAlreadyUsed,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Your registration is pending approval")]
    PendingApproval,

    #[error("Access denied. Admin privileges required")]
    AccessDenied,

    #[error("User record not found")]
    AccountRecordMissing,

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::MissingToken => {
                AppError::BadRequest(anyhow::anyhow!("Registration token is missing"))
            }
            ServiceError::InvalidToken => {
                AppError::BadRequest(anyhow::anyhow!("Invalid registration token"))
            }
            ServiceError::TokenExpired => {
                AppError::BadRequest(anyhow::anyhow!("Registration token has expired"))
            }
            ServiceError::TokenAlreadyUsed => {
                AppError::BadRequest(anyhow::anyhow!("Registration token has already been used"))
            }
            ServiceError::Identity(e) => e.into(),
            ServiceError::PendingApproval => {
                AppError::Forbidden(anyhow::anyhow!("Your registration is pending approval"))
            }
            ServiceError::AccessDenied => {
                AppError::Forbidden(anyhow::anyhow!("Access denied. Admin privileges required"))
            }
            ServiceError::AccountRecordMissing => {
                AppError::Forbidden(anyhow::anyhow!("User record not found"))
            }
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
        }
    }
}
