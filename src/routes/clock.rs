//! # 출퇴근 이벤트 핸들러
//!
//! ## 엔드포인트
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/clock | `clock` | 출근(clockin) / 퇴근(clockout) |
//!
//! 퇴근 시 세션 시간을 원장에 커밋하고, 이번 주 누적 시간과 달성률을 돌려줍니다.

use axum::{extract::State, Json};
use chrono::DateTime;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{ClockAction, ClockRequest, Milestone, WeekKey},
    routes::AppState,
    services::{evaluation::percent_of, Notification},
};

/// `POST /api/v1/clock`
///
/// - clockin → `{ "status": "ok", "reopened": false }`
/// - clockout → `{ "status": "ok", "session": {...}, "percent": 50, "milestone": "halfway" }`
pub async fn clock(
    State(state): State<AppState>,
    Json(req): Json<ClockRequest>,
) -> Result<Json<Value>, AppError> {
    if req.discord_id.trim().is_empty() || req.identifier.trim().is_empty() {
        return Err(AppError::BadRequest(
            "discordId and identifier are required".to_string(),
        ));
    }
    // 주차 키로 표현할 수 있는 연도(1..=9999)만 받습니다.
    let timestamp = DateTime::from_timestamp(req.timestamp, 0)
        .filter(|t| WeekKey::supports(t.date_naive()))
        .ok_or_else(|| {
            AppError::BadRequest(format!("timestamp out of range: {}", req.timestamp))
        })?;
    let display_name = req.name.as_deref().unwrap_or(&req.discord_id);

    match req.action {
        ClockAction::ClockIn => {
            let clock_in = state
                .tracker
                .on_clock_in(&req.discord_id, &req.identifier, timestamp);
            tracing::info!("{} clocked in", display_name);

            state.notifier.send(Notification::ClockedIn {
                person_key: req.discord_id.clone(),
                name: req.name.clone(),
                timestamp: req.timestamp,
                reopened: clock_in.reopened,
            });

            Ok(Json(json!({ "status": "ok", "reopened": clock_in.reopened })))
        }
        ClockAction::ClockOut => {
            // 설정이 잘못되었으면 원장을 건드리기 전에 실패합니다.
            let required_seconds = state.config.required_seconds()?;

            let session = state
                .tracker
                .on_clock_out(&req.discord_id, &req.identifier, timestamp)
                .await?;
            tracing::info!(
                "{} clocked out after {} sec",
                display_name,
                session.session_seconds
            );

            let percent = percent_of(session.new_week_total, required_seconds)?;
            let milestone = Milestone::for_percent(percent);

            state.notifier.send(Notification::ClockedOut {
                name: req.name.clone(),
                session: session.clone(),
                percent,
                milestone,
            });

            Ok(Json(json!({
                "status": "ok",
                "session": session,
                "percent": percent,
                "milestone": milestone,
            })))
        }
    }
}
