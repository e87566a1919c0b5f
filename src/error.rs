//! # 에러 처리 모듈
//!
//! 원장(ledger) 연산에서 발생할 수 있는 모든 에러 종류를 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 에러 종류(kind)를 variant로 구분
//! - `code()`: 로깅/사용자 메시지용 안정적인 에러 코드 문자열
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! `StorageUnavailable`은 내부에서 재시도하지 않고 그대로 호출자에게 전달합니다.
//! 재시도 정책은 요청의 멱등성을 아는 호출자(전송 계층)가 결정합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 원장 연산에서 발생할 수 있는 모든 에러 종류
///
/// 각 variant가 곧 에러의 "종류"이며, 호출자까지 그대로 전파됩니다.
/// 핸들러에서 `Result<T, AppError>`를 반환하면
/// Axum이 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 음수 또는 표현할 수 없는 근무 시간 (HTTP 400)
    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(i64),

    /// 출근 기록 없이 퇴근 요청 (HTTP 404)
    /// 원장에는 아무것도 기록되지 않습니다.
    #[error("No active session for {person_key} ({external_identifier})")]
    NoActiveSession {
        person_key: String,
        external_identifier: String,
    },

    /// 잘못된 설정값, 예: 0 이하의 요구 시간 (HTTP 500)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// 저장소 트랜잭션 실패 (HTTP 503)
    /// #[from]: sqlx::Error → AppError::StorageUnavailable 자동 변환
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    /// 주간 전환 중 목적지 주차 충돌 (HTTP 409)
    #[error("Rotation conflict: {person_key} already has an entry for {week_key}")]
    RotationConflict {
        person_key: String,
        week_key: String,
    },

    /// 호출자가 보낸 값이 잘못됨 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),
}

// 마이그레이션 실패도 저장소 문제로 취급합니다.
impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::StorageUnavailable(sqlx::Error::Migrate(Box::new(err)))
    }
}

impl AppError {
    /// 에러 종류를 나타내는 고정 문자열을 반환합니다.
    ///
    /// 로그나 응답 본문에서 variant를 구분할 때 사용합니다.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidDuration(_) => "invalid_duration",
            AppError::NoActiveSession { .. } => "no_active_session",
            AppError::InvalidConfiguration(_) => "invalid_configuration",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::RotationConflict { .. } => "rotation_conflict",
            AppError::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 저장소 에러와 설정 에러는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match self {
            AppError::InvalidDuration(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::NoActiveSession { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::RotationConflict { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidConfiguration(ref msg) => {
                tracing::error!("Invalid configuration: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The server is misconfigured".to_string(),
                )
            }
            AppError::StorageUnavailable(ref e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage is temporarily unavailable".to_string(),
                )
            }
        };

        // 결과: { "error": { "code": "no_active_session", "message": "..." } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
