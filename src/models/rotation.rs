//! # 주간 전환(rotation) 모델

use serde::{Deserialize, Serialize};

use super::WeekKey;

/// 주간 전환 기록: DB의 `rotations` 테이블 한 행 (추가 전용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RotationRecord {
    pub id: i64,
    /// 전환을 실행한 사람
    pub actor_person_key: String,
    /// 실행 시각 (유닉스 초)
    pub timestamp: i64,
    /// 전환 후 "다음 주"로 표시되는 주차
    pub resulting_week_key: WeekKey,
}

/// 전환 중 두 원본 주차가 같은 목적지로 향한 경우
///
/// 정상 입력에서는 발생하지 않습니다. 더 오래된 원본을 버리고 이 기록을 남깁니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationCollision {
    pub person_key: String,
    pub destination_week: WeekKey,
    /// 목적지에 남은 (더 최근) 원본 주차
    pub kept_source: WeekKey,
    /// 버려진 (더 오래된) 원본 주차와 그 누적 시간
    pub dropped_source: WeekKey,
    pub dropped_total: i64,
}

/// 주간 전환 결과 요약
#[derive(Debug, Clone, Serialize)]
pub struct RotationOutcome {
    pub record: RotationRecord,
    /// 전환된 인원 수
    pub persons_rotated: usize,
    /// 한 칸씩 밀려 보존된 엔트리 수
    pub entries_kept: usize,
    /// 보존 범위(12주)를 벗어나 삭제된 엔트리 수
    pub entries_dropped: usize,
    pub collisions: Vec<RotationCollision>,
}

/// 주간 전환 요청: `POST /api/v1/weeks/advance`의 요청 본문
#[derive(Debug, Deserialize)]
pub struct AdvanceWeekRequest {
    /// 전환을 실행하는 사람의 person_key
    pub actor: String,
}

/// `GET /api/v1/weeks/rotations?limit=N`의 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct RotationsQuery {
    /// 최대 조회 건수 (없으면 20)
    pub limit: Option<u32>,
}
