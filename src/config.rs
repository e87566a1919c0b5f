//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `HOST`: 서버 바인딩 주소
//! - `PORT`: 서버 포트 번호
//! - `REQUIRED_MINUTES`: 승진 자격을 위한 주간 최소 근무 시간(분)

use std::env;

use crate::error::AppError;

/// 설정이 없을 때 사용하는 주간 요구 근무 시간(분)
pub const DEFAULT_REQUIRED_MINUTES: i64 = 240;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후 `AppState`로 전달됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 경로 (예: "sqlite:data/staffhours.db")
    pub database_url: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 주간 요구 근무 시간(분) (기본값: 240)
    pub required_minutes: i64,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            required_minutes: parse_required_minutes(env::var("REQUIRED_MINUTES").ok()),
        })
    }

    /// 요구 근무 시간을 초 단위로 반환합니다.
    pub fn required_seconds(&self) -> Result<i64, AppError> {
        if self.required_minutes <= 0 {
            return Err(AppError::InvalidConfiguration(format!(
                "REQUIRED_MINUTES must be positive, got {}",
                self.required_minutes
            )));
        }
        self.required_minutes.checked_mul(60).ok_or_else(|| {
            AppError::InvalidConfiguration(format!(
                "REQUIRED_MINUTES is too large: {}",
                self.required_minutes
            ))
        })
    }
}

/// `REQUIRED_MINUTES` 값을 해석합니다.
///
/// 없으면 기본값, 숫자가 아니면 경고를 남기고 기본값을 씁니다.
/// 0 이하 값은 그대로 두어 `required_seconds()`에서 `InvalidConfiguration`이 되게 합니다.
fn parse_required_minutes(raw: Option<String>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_REQUIRED_MINUTES;
    };
    match raw.trim().parse() {
        Ok(minutes) => minutes,
        Err(e) => {
            tracing::warn!(
                "REQUIRED_MINUTES={:?} is not a number ({}); using {}",
                raw,
                e,
                DEFAULT_REQUIRED_MINUTES
            );
            DEFAULT_REQUIRED_MINUTES
        }
    }
}
