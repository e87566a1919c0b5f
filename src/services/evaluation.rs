//! # 평가 리포터 (EvaluationReporter)
//!
//! 원장 내용을 읽어 주간/롤링 합계, 12주 평가 리포트, 승진 자격 목록을 계산합니다.
//! 모든 함수는 읽기 전용입니다.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::models::{EvaluationReport, PromotionCandidate, WeekKey, WeekSummary};
use crate::services::rotation::RETAINED_WEEKS;
use crate::services::week::week_key_offset;

/// 롤링 윈도우 기본 크기 (주)
pub const WINDOW_WEEKS: u32 = RETAINED_WEEKS as u32;

/// `seconds`가 `required_seconds`의 몇 %인지 (0..=100, 내림)
///
/// `required_seconds <= 0`이면 `InvalidConfiguration`.
pub fn percent_of(seconds: i64, required_seconds: i64) -> Result<u32, AppError> {
    if required_seconds <= 0 {
        return Err(AppError::InvalidConfiguration(format!(
            "required seconds must be positive, got {required_seconds}"
        )));
    }
    let percent = i128::from(seconds.max(0)) * 100 / i128::from(required_seconds);
    Ok(percent.min(100) as u32)
}

/// `week_offset`주 전(0 = 이번 주)의 누적 근무 시간. 기록이 없으면 0.
pub async fn weekly_total(
    pool: &SqlitePool,
    person_key: &str,
    week_offset: i64,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let window = db::get_window(pool, person_key, WINDOW_WEEKS).await?;
    let week_key = week_key_offset(now, -week_offset);
    Ok(window.get(&week_key).copied().unwrap_or(0))
}

/// 이번 주부터 `weeks`주 동안의 합계 (offset `0..weeks`의 `weekly_total` 합)
pub async fn rolling_total(
    pool: &SqlitePool,
    person_key: &str,
    weeks: u32,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    // 윈도우를 한 번만 읽어 주마다 다시 조회하지 않습니다.
    let window = db::get_window(pool, person_key, weeks.max(WINDOW_WEEKS)).await?;
    let total: i64 = (0..i64::from(weeks))
        .map(|offset| week_key_offset(now, -offset))
        .filter_map(|week_key| window.get(&week_key))
        .sum();
    Ok(total)
}

/// 해당 주에 `required_seconds` 이상 근무한 사람 목록
///
/// 근무 시간 내림차순, 같으면 person_key 오름차순으로 정렬합니다.
pub async fn promotion_eligible(
    pool: &SqlitePool,
    week_key: WeekKey,
    required_seconds: i64,
) -> Result<Vec<PromotionCandidate>, AppError> {
    let mut eligible: Vec<PromotionCandidate> = db::list_entries_for_week(pool, week_key)
        .await?
        .into_iter()
        .filter(|(_, seconds)| *seconds >= required_seconds)
        .map(|(person_key, seconds)| PromotionCandidate {
            person_key,
            seconds,
        })
        .collect();

    eligible.sort_by(|a, b| {
        b.seconds
            .cmp(&a.seconds)
            .then_with(|| a.person_key.cmp(&b.person_key))
    });
    Ok(eligible)
}

/// 한 사람의 최근 12주 평가 리포트
///
/// 주별 비율은 `required_seconds` 대비, 합계 비율은 `required_seconds * 12` 대비입니다.
pub async fn evaluate(
    pool: &SqlitePool,
    person_key: &str,
    now: DateTime<Utc>,
    required_seconds: i64,
) -> Result<EvaluationReport, AppError> {
    let window = db::get_window(pool, person_key, WINDOW_WEEKS).await?;

    let mut weeks = Vec::with_capacity(WINDOW_WEEKS as usize);
    for offset in 0..WINDOW_WEEKS {
        let week_key = week_key_offset(now, -i64::from(offset));
        let seconds = window.get(&week_key).copied().unwrap_or(0);
        weeks.push(WeekSummary {
            offset,
            week_key,
            seconds,
            percent: percent_of(seconds, required_seconds)?,
        });
    }

    let combined_seconds = weeks
        .iter()
        .fold(0i64, |acc, w| acc.saturating_add(w.seconds));
    let combined_required = required_seconds
        .checked_mul(i64::from(WINDOW_WEEKS))
        .ok_or_else(|| {
            AppError::InvalidConfiguration(format!(
                "required seconds too large for a {WINDOW_WEEKS}-week window: {required_seconds}"
            ))
        })?;
    let combined_percent = percent_of(combined_seconds, combined_required)?;

    Ok(EvaluationReport {
        person_key: person_key.to_string(),
        required_seconds,
        weeks,
        combined_seconds,
        combined_percent,
    })
}
