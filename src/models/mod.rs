//! # 데이터 모델 모듈
//!
//! 원장 서비스에서 사용하는 데이터 구조체들을 정의합니다.
//! - `week`: ISO 주차 키(WeekKey)
//! - `hours`: 원장 엔트리와 커밋된 세션
//! - `clock`: 출퇴근 이벤트 요청/응답
//! - `rotation`: 주간 전환 기록과 결과
//! - `evaluation`: 평가 리포트와 승진 자격자
//!
//! `pub use X::*;`로 재공개하여 `crate::models::WeekKey`처럼 짧게 접근합니다.

pub mod clock;
pub mod evaluation;
pub mod hours;
pub mod rotation;
pub mod week;

pub use clock::*;
pub use evaluation::*;
pub use hours::*;
pub use rotation::*;
pub use week::*;
