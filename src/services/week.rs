//! # 주차 계산기 (WeekKeyCalculator)
//!
//! 시각을 ISO-8601 주차 키로 바꾸는 순수 함수들입니다. 모든 계산은 UTC 기준입니다.

use chrono::{DateTime, Duration, Utc};

use crate::models::WeekKey;

/// 시각이 속한 ISO 주차
pub fn week_key_of(timestamp: DateTime<Utc>) -> WeekKey {
    WeekKey::containing(timestamp.date_naive())
}

/// `reference + offset_weeks * 7일`이 속한 ISO 주차
///
/// 음수는 과거, 양수는 미래(주간 전환의 "다음 주" 표시용)입니다.
/// `week_key_offset(t, 0) == week_key_of(t)`가 항상 성립합니다.
pub fn week_key_offset(reference: DateTime<Utc>, offset_weeks: i64) -> WeekKey {
    week_key_of(reference + Duration::weeks(offset_weeks))
}

/// `from`에서 `to`까지 몇 주 떨어져 있는지 (부호 있음)
///
/// `weeks_between(과거 주, 이번 주)`는 양수, 즉 "몇 주 전"이 됩니다.
pub fn weeks_between(from: WeekKey, to: WeekKey) -> i64 {
    (to.monday() - from.monday()).num_days() / 7
}
