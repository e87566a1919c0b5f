//! # 라우트 핸들러 모듈
//!
//! 게임 서버와 채팅 봇이 원장 연산을 호출하는 HTTP 핸들러들입니다.
//! 핸들러는 요청을 검증하고 서비스 계층을 호출한 뒤, 결과를 JSON으로 돌려줍니다.
//! 알림은 `Notifier`로 넘기기만 하고 기다리지 않습니다.
//!
//! 각 하위 모듈:
//! - `clock`: 출근/퇴근 이벤트
//! - `evaluation`: 12주 평가, 승진 자격 목록
//! - `weeks`: 주간 전환과 전환 기록
//! - `health`: 서버/DB 상태 확인

pub mod clock;
pub mod evaluation;
pub mod health;
pub mod weeks;

pub use clock::*;
pub use evaluation::*;
pub use health::*;
pub use weeks::*;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::{Notifier, SessionTracker, WeekRotationEngine};

/// 애플리케이션 공유 상태
///
/// 모든 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 전역 변수 대신 `main`에서 한 번 만들어 주입합니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    pub config: Config,
    /// 진행 중인 출퇴근 세션 (프로세스 메모리)
    pub tracker: Arc<SessionTracker>,
    /// 주간 전환 엔진 (동시에 하나의 전환만 실행)
    pub rotation: Arc<WeekRotationEngine>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config, notifier: Notifier) -> Self {
        Self {
            tracker: Arc::new(SessionTracker::new(pool.clone())),
            rotation: Arc::new(WeekRotationEngine::new(pool.clone())),
            pool,
            config,
            notifier,
        }
    }
}
