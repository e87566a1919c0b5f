//! # 평가(evaluation) 모델
//!
//! 최근 12주 근무 현황과 승진 자격 목록을 나타내는 구조체들입니다.

use serde::{Deserialize, Serialize};

use super::WeekKey;

/// 한 주의 근무 현황 (offset 0 = 이번 주)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSummary {
    pub offset: u32,
    pub week_key: WeekKey,
    pub seconds: i64,
    /// 주간 요구 시간 대비 비율 (0..=100)
    pub percent: u32,
}

/// 한 사람의 롤링 윈도우 평가 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    pub person_key: String,
    pub required_seconds: i64,
    pub weeks: Vec<WeekSummary>,
    pub combined_seconds: i64,
    /// `required_seconds * 주 수` 대비 비율 (0..=100)
    pub combined_percent: u32,
}

/// 승진 자격자 한 명
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionCandidate {
    pub person_key: String,
    pub seconds: i64,
}

/// `GET /api/v1/promotions?week=2025-W10`의 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct PromotionsQuery {
    /// 대상 주차 (없으면 이번 주)
    pub week: Option<WeekKey>,
}

/// `GET /api/v1/totals/{person_key}?weeks=N`의 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct TotalsQuery {
    /// 롤링 합계 기간 (없으면 12주)
    pub weeks: Option<u32>,
}
