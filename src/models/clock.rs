//! # 출퇴근 이벤트 모델
//!
//! 게임 서버가 보내는 `POST /api/v1/clock` 요청 본문과 그 응답 구조체입니다.
//!
//! ## 요청 예시
//! ```json
//! { "action": "clockout", "identifier": "license:abc", "discordId": "1234",
//!   "name": "Alex", "timestamp": 1739180000 }
//! ```

use serde::{Deserialize, Serialize};

/// 출근/퇴근 구분
///
/// `rename_all = "lowercase"`: JSON에서는 `"clockin"`, `"clockout"`으로 표기합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockAction {
    ClockIn,
    ClockOut,
}

/// 출퇴근 이벤트 요청 본문
#[derive(Debug, Clone, Deserialize)]
pub struct ClockRequest {
    pub action: ClockAction,
    /// 게임 서버 계정 식별자 → externalIdentifier
    pub identifier: String,
    /// 채팅 플랫폼 계정 ID → personKey
    #[serde(rename = "discordId")]
    pub discord_id: String,
    /// 표시용 이름 (알림에만 사용)
    pub name: Option<String>,
    /// 이벤트 발생 시각 (유닉스 초)
    pub timestamp: i64,
}

/// 출근 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockIn {
    /// 이미 근무 중이었는데 다시 출근한 경우 true (시작 시각을 덮어씀)
    pub reopened: bool,
}

/// 주간 목표 달성 구간
///
/// 퇴근 응답에서 진행 상황을 데이터로 전달합니다. 화면 표현은 호출자 몫입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Milestone {
    /// 100% 이상
    Completed,
    /// 75% 이상
    Almost,
    /// 50% 이상
    Halfway,
}

impl Milestone {
    pub fn for_percent(percent: u32) -> Option<Self> {
        match percent {
            100.. => Some(Milestone::Completed),
            75..=99 => Some(Milestone::Almost),
            50..=74 => Some(Milestone::Halfway),
            _ => None,
        }
    }
}
