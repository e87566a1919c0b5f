//! # 주간 전환 기록 쿼리 모듈
//!
//! `rotations` 테이블은 추가 전용(append-only)입니다.
//! 수정/삭제 함수는 의도적으로 두지 않습니다.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{RotationRecord, WeekKey};

/// 주간 전환 기록을 한 건 추가하고, 저장된 행을 반환합니다.
pub async fn append_rotation(
    pool: &SqlitePool,
    actor_person_key: &str,
    timestamp: i64,
    resulting_week_key: WeekKey,
) -> Result<RotationRecord, AppError> {
    let record = sqlx::query_as::<_, RotationRecord>(
        r#"
        INSERT INTO rotations (actor_person_key, timestamp, resulting_week_key)
        VALUES (?, ?, ?)
        RETURNING id, actor_person_key, timestamp, resulting_week_key
        "#,
    )
    .bind(actor_person_key)
    .bind(timestamp)
    .bind(resulting_week_key)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// 최근 전환 기록을 최신순으로 최대 `limit`건 조회합니다.
pub async fn list_rotations(pool: &SqlitePool, limit: u32) -> Result<Vec<RotationRecord>, AppError> {
    let records = sqlx::query_as::<_, RotationRecord>(
        r#"
        SELECT id, actor_person_key, timestamp, resulting_week_key
        FROM rotations
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn records_are_listed_newest_first() {
        let pool = test_pool().await;
        let w1 = WeekKey::from_iso(2025, 10).unwrap();
        let w2 = WeekKey::from_iso(2025, 11).unwrap();

        let first = append_rotation(&pool, "admin", 1_000, w1).await.unwrap();
        let second = append_rotation(&pool, "admin", 2_000, w2).await.unwrap();
        assert!(second.id > first.id);

        let listed = list_rotations(&pool, 10).await.unwrap();
        assert_eq!(listed, vec![second, first]);
        assert_eq!(list_rotations(&pool, 1).await.unwrap().len(), 1);
    }
}
