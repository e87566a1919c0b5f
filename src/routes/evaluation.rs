//! # 평가 조회 핸들러
//!
//! ## 엔드포인트
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/v1/evaluate/{person_key} | `evaluate` | 최근 12주 평가 리포트 |
//! | GET | /api/v1/totals/{person_key} | `totals` | 이번 주 합계와 롤링 합계 |
//! | GET | /api/v1/promotions | `promotions` | 이번 주(또는 `?week=`) 승진 자격 목록 |

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{EvaluationReport, PromotionsQuery, TotalsQuery},
    routes::AppState,
    services::{evaluation, week::week_key_of},
};

/// `GET /api/v1/evaluate/{person_key}`: 최근 12주 평가 리포트
pub async fn evaluate(
    State(state): State<AppState>,
    Path(person_key): Path<String>,
) -> Result<Json<EvaluationReport>, AppError> {
    let required_seconds = state.config.required_seconds()?;
    let report =
        evaluation::evaluate(&state.pool, &person_key, Utc::now(), required_seconds).await?;
    Ok(Json(report))
}

/// `GET /api/v1/totals/{person_key}?weeks=4`
///
/// → `{ "person_key": "...", "this_week": 3600, "weeks": 4, "rolling": 9000 }`
pub async fn totals(
    State(state): State<AppState>,
    Path(person_key): Path<String>,
    Query(query): Query<TotalsQuery>,
) -> Result<Json<Value>, AppError> {
    let weeks = query.weeks.unwrap_or(evaluation::WINDOW_WEEKS);
    if weeks == 0 || weeks > evaluation::WINDOW_WEEKS {
        return Err(AppError::BadRequest(format!(
            "weeks must be between 1 and {}",
            evaluation::WINDOW_WEEKS
        )));
    }

    let now = Utc::now();
    let this_week = evaluation::weekly_total(&state.pool, &person_key, 0, now).await?;
    let rolling = evaluation::rolling_total(&state.pool, &person_key, weeks, now).await?;

    Ok(Json(json!({
        "person_key": person_key,
        "this_week": this_week,
        "weeks": weeks,
        "rolling": rolling,
    })))
}

/// `GET /api/v1/promotions?week=2025-W07`
///
/// `week`을 생략하면 현재 주를 기준으로 합니다.
pub async fn promotions(
    State(state): State<AppState>,
    Query(query): Query<PromotionsQuery>,
) -> Result<Json<Value>, AppError> {
    let required_seconds = state.config.required_seconds()?;
    let week_key = query.week.unwrap_or_else(|| week_key_of(Utc::now()));

    let eligible = evaluation::promotion_eligible(&state.pool, week_key, required_seconds).await?;
    tracing::debug!("{} eligible for promotion in {}", eligible.len(), week_key);

    Ok(Json(json!({
        "week_key": week_key,
        "required_minutes": state.config.required_minutes,
        "eligible": eligible,
    })))
}
