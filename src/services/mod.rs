//! # 서비스 계층
//!
//! 원장 위에서 동작하는 도메인 로직입니다.
//! - `week`: ISO 주차 계산 (순수 함수)
//! - `tracker`: 출퇴근 세션 상태 기계
//! - `rotation`: 주간 전환 엔진
//! - `evaluation`: 주간/롤링 합계와 승진 자격
//! - `notifier`: 비동기 알림 채널

pub mod evaluation;
pub mod notifier;
pub mod rotation;
pub mod tracker;
pub mod week;

pub use notifier::{Notification, Notifier};
pub use rotation::WeekRotationEngine;
pub use tracker::SessionTracker;
