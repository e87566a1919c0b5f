//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 원장과 주간 전환 기록을 저장하는 SQLite 쿼리 함수들입니다.
//! 서비스(services/)와 라우트 핸들러(routes/)가 이 모듈을 호출합니다.
//!
//! 각 하위 모듈:
//! - `hours`: 근무시간 원장(`hours` 테이블)
//! - `rotations`: 주간 전환 기록(`rotations` 테이블)

pub mod hours;
pub mod rotations;

pub use hours::*;
pub use rotations::*;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::AppError;

/// SQLite 연결 풀을 만들고 마이그레이션을 실행합니다.
///
/// - WAL 모드: 주간 전환 트랜잭션이 진행 중이어도 조회는 막히지 않고,
///   커밋된 상태만 보게 됩니다.
/// - busy_timeout: 다른 연결이 쓰기 잠금을 잡고 있으면 최대 5초까지 기다립니다.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// 테스트용 인메모리 풀
///
/// `sqlite::memory:`는 연결마다 별도 DB가 생기므로 연결을 하나로 고정합니다.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

/// 테스트용 파일 기반 풀
///
/// `connect`와 같은 설정(WAL, busy_timeout, 연결 5개)이라 연결들이 실제로 동시에 동작합니다.
/// 반환된 `TempDir`이 drop되면 DB 파일도 지워지므로 테스트 끝까지 들고 있어야 합니다.
#[cfg(test)]
pub async fn file_pool() -> (tempfile::TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
    let pool = connect(&url).await.expect("file-backed sqlite");
    (dir, pool)
}
