//! # 근무시간 원장 모델
//!
//! `hours` 테이블 한 행과, 퇴근 처리 결과를 나타내는 구조체들입니다.

use serde::Serialize;

use super::WeekKey;

/// 원장 엔트리: DB의 `hours` 테이블 한 행에 대응합니다.
///
/// `(person_key, week_key)` 조합은 유일합니다.
/// `total`은 해당 주에 누적된 근무 시간(초)이며 음수가 될 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LedgerEntry {
    /// 채팅 플랫폼 계정 등 외부 신원 키
    pub person_key: String,
    /// 게임 서버 계정 등 외부 시스템 식별자 (마지막으로 기록된 값)
    pub external_identifier: String,
    pub week_key: WeekKey,
    pub total: i64,
}

/// 퇴근 처리로 원장에 커밋된 세션
///
/// 알림(notifier)이나 API 응답에서 그대로 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedSession {
    pub person_key: String,
    pub external_identifier: String,
    /// 퇴근 시각이 속한 주차
    pub week_key: WeekKey,
    /// 이번 세션의 근무 시간(초)
    pub session_seconds: i64,
    /// 커밋 직후 해당 주의 누적 근무 시간(초)
    pub new_week_total: i64,
}
