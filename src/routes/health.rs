//! # 헬스체크 핸들러
//!
//! - `GET /api/v1/health` → `{ "status": "ok" }`
//!
//! 원장 DB에 `SELECT 1`을 보내 저장소까지 살아 있는지 확인합니다.
//! DB에 닿지 못하면 `StorageUnavailable`(503)을 반환합니다.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{error::AppError, routes::AppState};

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::test_state;

    #[tokio::test]
    async fn reports_ok_when_storage_answers() {
        let (state, _rx) = test_state().await;
        let Json(body) = health_check(State(state)).await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn closed_pool_is_storage_unavailable() {
        let (state, _rx) = test_state().await;
        state.pool.close().await;

        let err = health_check(State(state)).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }
}
