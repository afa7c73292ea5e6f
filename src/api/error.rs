use crate::application::loan::{ErrorKind, LoanApplicationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    /// 貸出エンジンのエラー
    Loan(LoanApplicationError),
    /// リソースが存在しない
    NotFound(String),
    /// パスやパラメータが不正
    BadRequest(String),
    /// リポジトリ等の想定外の失敗
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Loan(err)
    }
}

/// エラー分類からHTTPステータスへの対応
///
/// ペナルティ・上限超過に加え、貸出中の書籍への貸出要求も403とする。
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Loan(err) => match err.kind() {
                // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                ErrorKind::Internal => {
                    tracing::error!(error = ?err, "Loan operation failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Server Error".to_string())
                }
                kind => (status_for(kind), err.to_string()),
            },
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error in query handler");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error".to_string())
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
