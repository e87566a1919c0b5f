//! # 근무시간 원장 쿼리 모듈
//!
//! `hours` 테이블에 대한 SQL 함수들입니다. `(person_key, week_key) → total` 원장을 관리합니다.
//!
//! ## 동시성
//! - `add_duration`은 `INSERT … ON CONFLICT DO UPDATE … RETURNING` 한 문장으로
//!   읽기-수정-쓰기를 DB 안에서 처리하므로, 동시에 호출되어도 증가분이 사라지지 않습니다.
//! - `delete_all_for_person`과 `rewrite_entry`는 주간 전환 전용이며
//!   반드시 같은 트랜잭션 안에서 호출됩니다 (`&mut SqliteConnection`을 받는 이유).
//! - 조회 함수는 잠금 없이 커밋된 상태만 읽습니다.

use std::collections::BTreeMap;

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::{LedgerEntry, WeekKey};

/// 세션 근무 시간을 원장에 더하고, 더한 뒤의 누적값을 반환합니다.
///
/// - 행이 없으면 `total = seconds`로 생성
/// - 행이 있으면 `total += seconds`, 외부 식별자는 최신 값으로 갱신
///
/// `seconds < 0`이면 DB에 접근하지 않고 `InvalidDuration`을 반환합니다.
pub async fn add_duration(
    pool: &SqlitePool,
    person_key: &str,
    external_identifier: &str,
    week_key: WeekKey,
    seconds: i64,
) -> Result<i64, AppError> {
    if seconds < 0 {
        return Err(AppError::InvalidDuration(seconds));
    }

    // RETURNING으로 갱신된 누적값을 같은 문장에서 읽어옵니다.
    let (total,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO hours (person_key, external_identifier, week_key, total)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (person_key, week_key) DO UPDATE SET
            total = hours.total + excluded.total,
            external_identifier = excluded.external_identifier
        RETURNING total
        "#,
    )
    .bind(person_key)
    .bind(external_identifier)
    .bind(week_key)
    .bind(seconds)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// 한 사람의 최근 `weeks_back`개 주차 기록을 조회합니다.
///
/// 기록이 있는 주차만 포함되며(최신순 상위 `weeks_back`개), 빈 주는 만들지 않습니다.
/// 호출자는 맵에 없는 주차를 0으로 취급합니다.
pub async fn get_window(
    pool: &SqlitePool,
    person_key: &str,
    weeks_back: u32,
) -> Result<BTreeMap<WeekKey, i64>, AppError> {
    let rows: Vec<(WeekKey, i64)> = sqlx::query_as(
        r#"
        SELECT week_key, total
        FROM hours
        WHERE person_key = ?
        ORDER BY week_key DESC
        LIMIT ?
        "#,
    )
    .bind(person_key)
    .bind(i64::from(weeks_back))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// 특정 주차에 기록이 있는 모든 사람과 누적 시간을 조회합니다.
pub async fn list_entries_for_week(
    pool: &SqlitePool,
    week_key: WeekKey,
) -> Result<Vec<(String, i64)>, AppError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT person_key, total FROM hours WHERE week_key = ? ORDER BY person_key",
    )
    .bind(week_key)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// 원장에 한 건 이상 기록이 있는 사람 목록
pub async fn list_person_keys(pool: &SqlitePool) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT person_key FROM hours ORDER BY person_key")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(p,)| p).collect())
}

/// 한 사람의 모든 엔트리를 삭제하고, 삭제된 행을 반환합니다.
///
/// 주간 전환 트랜잭션의 첫 문장으로 사용됩니다.
/// 쓰기 문장으로 시작하므로 SQLite 쓰기 잠금을 처음부터 잡게 되고,
/// 그 사이에 들어온 `add_duration`은 전환 이전 또는 이후로 직렬화됩니다.
pub async fn delete_all_for_person(
    conn: &mut SqliteConnection,
    person_key: &str,
) -> Result<Vec<LedgerEntry>, AppError> {
    let removed = sqlx::query_as::<_, LedgerEntry>(
        r#"
        DELETE FROM hours
        WHERE person_key = ?
        RETURNING person_key, external_identifier, week_key, total
        "#,
    )
    .bind(person_key)
    .fetch_all(conn)
    .await?;

    Ok(removed)
}

/// 엔트리의 누적값을 더하지 않고 그대로 기록합니다 (주간 전환 전용).
///
/// 목적지 행이 이미 있으면 덮어쓰지 않습니다.
/// 같은 값이면 이미 기록된 것으로 보고 성공(멱등), 다른 값이면 `RotationConflict`.
pub async fn rewrite_entry(
    conn: &mut SqliteConnection,
    person_key: &str,
    external_identifier: &str,
    week_key: WeekKey,
    seconds: i64,
) -> Result<(), AppError> {
    if seconds < 0 {
        return Err(AppError::InvalidDuration(seconds));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO hours (person_key, external_identifier, week_key, total)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (person_key, week_key) DO NOTHING
        "#,
    )
    .bind(person_key)
    .bind(external_identifier)
    .bind(week_key)
    .bind(seconds)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT total FROM hours WHERE person_key = ? AND week_key = ?")
            .bind(person_key)
            .bind(week_key)
            .fetch_optional(&mut *conn)
            .await?;

    match existing {
        Some((total,)) if total == seconds => Ok(()),
        _ => Err(AppError::RotationConflict {
            person_key: person_key.to_string(),
            week_key: week_key.to_string(),
        }),
    }
}
