use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    SlotExpired(String),
    #[error("{0}")]
    SlotLimitReached(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("{0}")]
    ConversionEntityDataStructureError(#[from] strum::ParseError),
    #[error("{0}")]
    ConversionToUuidError(#[from] uuid::Error),
    #[error("ストレージへのアクセスに失敗しました。")]
    StorageUnavailable(#[source] anyhow::Error),
    #[error("ログインが必要です。")]
    UnauthenticatedError,
    #[error("許可されていない操作です。")]
    ForbiddenOperation,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match self {
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            // 前提条件の不成立は、再読込すれば解消しうる衝突として返す
            AppError::SlotExpired(_) | AppError::SlotLimitReached(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_)
            | AppError::ConversionEntityError(_)
            | AppError::ConversionEntityDataStructureError(_)
            | AppError::ConversionToUuidError(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthenticatedError => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenOperation => StatusCode::FORBIDDEN,
            AppError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match status_code {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(
                    error.cause_chain = ?self,
                    error.message = %self,
                    "Unexpected error happened"
                );
            }
            _ => {
                tracing::warn!(
                    error.cause_chain = ?self,
                    error.message = %self,
                    "Client error happened"
                );
            }
        }
        status_code.into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
