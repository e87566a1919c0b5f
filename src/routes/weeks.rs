//! # 주간 전환 핸들러
//!
//! ## 엔드포인트
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/weeks/advance | `advance_week` | 모든 기록을 한 주 과거로 밀기 |
//! | GET | /api/v1/weeks/rotations | `list_rotations` | 전환 기록 (최신순) |
//!
//! 누가 전환을 실행할 수 있는지는 호출자(채팅 봇)가 판단합니다.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::{
    db,
    error::AppError,
    models::{AdvanceWeekRequest, RotationOutcome, RotationRecord, RotationsQuery},
    routes::AppState,
    services::Notification,
};

const DEFAULT_ROTATION_LIMIT: u32 = 20;

/// `POST /api/v1/weeks/advance`: 주간 전환 실행
pub async fn advance_week(
    State(state): State<AppState>,
    Json(req): Json<AdvanceWeekRequest>,
) -> Result<Json<RotationOutcome>, AppError> {
    if req.actor.trim().is_empty() {
        return Err(AppError::BadRequest("actor is required".to_string()));
    }

    let outcome = state.rotation.advance_week(&req.actor, Utc::now()).await?;

    state.notifier.send(Notification::WeekAdvanced {
        record: outcome.record.clone(),
    });

    Ok(Json(outcome))
}

/// `GET /api/v1/weeks/rotations?limit=20`
pub async fn list_rotations(
    State(state): State<AppState>,
    Query(query): Query<RotationsQuery>,
) -> Result<Json<Vec<RotationRecord>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_ROTATION_LIMIT);
    let records = db::list_rotations(&state.pool, limit).await?;
    Ok(Json(records))
}
