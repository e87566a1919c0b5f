//! # 주간 전환 엔진 (WeekRotationEngine)
//!
//! "다음 주로 넘기기" 연산입니다. 모든 사람의 주차별 기록을 한 칸씩 과거로 밀고,
//! 보존 범위(offset 0..=11)를 벗어난 기록은 삭제한 뒤 전환 기록을 남깁니다.
//!
//! ## 처리 흐름 (한 사람 단위)
//! ```text
//! BEGIN
//!   DELETE … RETURNING           ← 기존 기록 전체를 꺼냄 (쓰기 잠금 획득)
//!   rebucket()                    ← 메모리에서 새 주차 배치 계산
//!   INSERT (rewrite_entry) × N    ← 새 배치 기록
//! COMMIT
//! ```
//! 조회 쪽은 커밋 전의 옛 상태나 커밋 후의 새 상태만 보게 되며, 섞인 상태는 보지 않습니다.
//!
//! 사람마다 독립된 트랜잭션이므로 여러 사람을 동시에 처리합니다.
//! 전환 자체는 한 번에 하나만 실행되도록 `in_flight` 잠금으로 직렬화합니다.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::db;
use crate::error::AppError;
use crate::models::{LedgerEntry, RotationCollision, RotationOutcome, WeekKey};
use crate::services::week::{week_key_of, week_key_offset, weeks_between};

/// 사람마다 보존하는 주 수 (offset 0..=11)
pub const RETAINED_WEEKS: i64 = 12;

/// 한 사람의 기록을 한 칸 민 결과
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Rebucketed {
    /// 새 주차로 옮겨진 엔트리
    pub kept: Vec<LedgerEntry>,
    /// 보존 범위를 벗어나 버려진 엔트리
    pub dropped: Vec<LedgerEntry>,
    pub collisions: Vec<RotationCollision>,
}

/// 엔트리들을 `now` 기준 recency offset으로 환산해 `offset + 1` 위치로 옮깁니다.
///
/// - offset 0 = `now`가 속한 주
/// - 새 offset이 `RETAINED_WEEKS` 이상이면 버립니다
/// - 두 원본이 같은 목적지로 가면 먼저 자리를 잡은 원본을 남기고, 나머지는 버린 뒤 경고합니다.
///   최신 주부터 처리하므로 주차가 다르면 더 최근 원본이, 주차가 같으면 입력 순서상 앞선 원본이 남습니다.
pub fn rebucket(entries: Vec<LedgerEntry>, now: DateTime<Utc>) -> Rebucketed {
    let current = week_key_of(now);
    let mut result = Rebucketed::default();
    let mut placed: BTreeMap<WeekKey, LedgerEntry> = BTreeMap::new();

    // 최신 주부터 처리해야 충돌 시 오래된 원본이 버려집니다.
    let mut entries = entries;
    entries.sort_by(|a, b| b.week_key.cmp(&a.week_key));

    for entry in entries {
        let new_offset = weeks_between(entry.week_key, current) + 1;
        if new_offset >= RETAINED_WEEKS {
            result.dropped.push(entry);
            continue;
        }

        let destination = week_key_offset(now, -new_offset);
        if let Some(kept) = placed.get(&destination) {
            tracing::warn!(
                person_key = %entry.person_key,
                %destination,
                kept_source = %kept.week_key,
                dropped_source = %entry.week_key,
                dropped_total = entry.total,
                "Rotation collision; dropping older source week"
            );
            result.collisions.push(RotationCollision {
                person_key: entry.person_key.clone(),
                destination_week: destination,
                kept_source: kept.week_key,
                dropped_source: entry.week_key,
                dropped_total: entry.total,
            });
            result.dropped.push(entry);
            continue;
        }

        placed.insert(destination, entry);
    }

    result.kept = placed
        .into_iter()
        .rev()
        .map(|(week_key, entry)| LedgerEntry { week_key, ..entry })
        .collect();
    result
}

/// 주간 전환을 실행하는 엔진
///
/// `AppState`에 `Arc`로 공유됩니다.
pub struct WeekRotationEngine {
    pool: SqlitePool,
    in_flight: Mutex<()>,
}

impl WeekRotationEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            in_flight: Mutex::new(()),
        }
    }

    /// 모든 사람의 기록을 한 주씩 밀고 전환 기록을 남깁니다.
    ///
    /// 한 사람이라도 실패하면 첫 번째 에러를 반환하고 전환 기록은 남기지 않습니다.
    /// 이미 커밋된 다른 사람의 전환은 되돌리지 않습니다 (사람 단위 원자성).
    ///
    /// 따라서 에러 후 그대로 다시 호출하면 이미 전환된 사람은 한 주 더 밀립니다.
    /// 재시도 전에 원장과 `list_rotations`를 확인해야 하며, 이 함수는 자동으로 재시도하지 않습니다.
    pub async fn advance_week(
        &self,
        actor_person_key: &str,
        now: DateTime<Utc>,
    ) -> Result<RotationOutcome, AppError> {
        let _guard = self.in_flight.lock().await;

        let persons = db::list_person_keys(&self.pool).await?;
        tracing::info!(
            actor = actor_person_key,
            persons = persons.len(),
            "Advancing week"
        );

        // 동시 실행 수는 풀의 연결 수로 제한됩니다.
        let mut set = JoinSet::new();
        for person_key in persons {
            let pool = self.pool.clone();
            set.spawn(async move { rotate_person(&pool, &person_key, now).await });
        }

        let mut persons_rotated = 0;
        let mut entries_kept = 0;
        let mut entries_dropped = 0;
        let mut collisions = Vec::new();
        let mut first_error = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(rebucketed)) => {
                    persons_rotated += 1;
                    entries_kept += rebucketed.kept.len();
                    entries_dropped += rebucketed.dropped.len();
                    collisions.extend(rebucketed.collisions);
                }
                Ok(Err(e)) => {
                    tracing::error!("Rotation failed for one person: {}", e);
                    first_error.get_or_insert(e);
                }
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let record = db::append_rotation(
            &self.pool,
            actor_person_key,
            now.timestamp(),
            week_key_offset(now, 1),
        )
        .await?;

        tracing::info!(
            actor = actor_person_key,
            resulting_week = %record.resulting_week_key,
            persons_rotated,
            entries_kept,
            entries_dropped,
            "Week advanced"
        );

        Ok(RotationOutcome {
            record,
            persons_rotated,
            entries_kept,
            entries_dropped,
            collisions,
        })
    }
}

/// 한 사람의 기록을 하나의 트랜잭션 안에서 재배치합니다.
async fn rotate_person(
    pool: &SqlitePool,
    person_key: &str,
    now: DateTime<Utc>,
) -> Result<Rebucketed, AppError> {
    let mut tx = pool.begin().await?;

    let removed = db::delete_all_for_person(&mut *tx, person_key).await?;
    let rebucketed = rebucket(removed, now);

    for entry in &rebucketed.kept {
        db::rewrite_entry(
            &mut *tx,
            &entry.person_key,
            &entry.external_identifier,
            entry.week_key,
            entry.total,
        )
        .await?;
    }

    // 에러로 여기까지 오지 못하면 tx가 drop되며 롤백됩니다.
    tx.commit().await?;
    Ok(rebucketed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{file_pool, test_pool};
    use std::sync::Arc;
    use crate::services::evaluation::{rolling_total, weekly_total};
    use chrono::TimeZone;
    use tracing_test::traced_test;

    fn now() -> DateTime<Utc> {
        // 2025-03-12(수)
        Utc.with_ymd_and_hms(2025, 3, 12, 15, 0, 0).unwrap()
    }

    fn entry(person: &str, week_key: WeekKey, total: i64) -> LedgerEntry {
        LedgerEntry {
            person_key: person.to_string(),
            external_identifier: format!("lic:{person}"),
            week_key,
            total,
        }
    }

    async fn seed_offsets(pool: &SqlitePool, person: &str, offsets: impl Iterator<Item = i64>) {
        for offset in offsets {
            db::add_duration(
                pool,
                person,
                &format!("lic:{person}"),
                week_key_offset(now(), -offset),
                100 + offset,
            )
            .await
            .unwrap();
        }
    }

    #[test]
    fn rebucket_shifts_every_entry_one_week_older() {
        let entries = (0..12)
            .map(|o| entry("p1", week_key_offset(now(), -o), 100 + o))
            .collect();

        let result = rebucket(entries, now());

        assert_eq!(result.kept.len(), 11);
        assert_eq!(result.dropped.len(), 1);
        assert_eq!(result.dropped[0].total, 111);
        assert!(result.collisions.is_empty());
        for e in &result.kept {
            let offset = weeks_between(e.week_key, week_key_of(now()));
            assert_eq!(e.total, 100 + offset - 1);
            assert!((1..=11).contains(&offset));
        }
    }

    #[test]
    fn rebucket_keeps_sparse_history_in_place_relative_to_now() {
        let entries = vec![
            entry("p1", week_key_offset(now(), 0), 10),
            entry("p1", week_key_offset(now(), -5), 50),
        ];

        let result = rebucket(entries, now());
        let kept: Vec<_> = result.kept.iter().map(|e| (e.week_key, e.total)).collect();
        assert_eq!(
            kept,
            vec![
                (week_key_offset(now(), -1), 10),
                (week_key_offset(now(), -6), 50),
            ]
        );
    }

    #[test]
    #[traced_test]
    fn rebucket_keeps_first_placed_source_on_collision() {
        // 서로 다른 주차는 목적지가 겹치지 않으므로, 같은 주차를 두 번 넣어 충돌을 만듭니다.
        // 같은 주차끼리는 입력 순서상 앞선 엔트리가 먼저 자리를 차지합니다.
        let w = week_key_offset(now(), -2);
        let first = entry("p1", w, 2);
        let second = entry("p1", w, 1);
        let current = entry("p1", week_key_offset(now(), 0), 7);

        let result = rebucket(vec![second.clone(), current, first.clone()], now());
        // 최신 주(offset 0)가 먼저 처리돼도 offset 2 쪽 순서는 바뀌지 않습니다.
        let result_swapped = rebucket(vec![first, second], now());

        let destination = week_key_offset(now(), -3);
        let kept_at = |r: &Rebucketed| {
            r.kept
                .iter()
                .find(|e| e.week_key == destination)
                .map(|e| e.total)
        };
        assert_eq!(kept_at(&result), Some(1));
        assert_eq!(result.kept.len(), 2);
        assert_eq!(result.collisions.len(), 1);
        assert_eq!(result.collisions[0].destination_week, destination);
        assert_eq!(result.collisions[0].dropped_total, 2);
        assert_eq!(result.dropped.len(), 1);
        assert_eq!(result.dropped[0].total, 2);

        assert_eq!(kept_at(&result_swapped), Some(2));
        assert_eq!(result_swapped.collisions[0].dropped_total, 1);
        assert!(logs_contain("Rotation collision"));
    }

    #[tokio::test]
    async fn advance_week_shifts_full_window_and_drops_oldest() {
        let pool = test_pool().await;
        seed_offsets(&pool, "p1", 0..12).await;
        let engine = WeekRotationEngine::new(pool.clone());

        let outcome = engine.advance_week("admin", now()).await.unwrap();
        assert_eq!(outcome.persons_rotated, 1);
        assert_eq!(outcome.entries_kept, 11);
        assert_eq!(outcome.entries_dropped, 1);
        assert_eq!(outcome.record.resulting_week_key, week_key_offset(now(), 1));
        assert_eq!(outcome.record.actor_person_key, "admin");

        let window = db::get_window(&pool, "p1", 12).await.unwrap();
        assert_eq!(window.len(), 11);
        assert!(!window.contains_key(&week_key_of(now())));
        for offset in 1..=11 {
            let total = window.get(&week_key_offset(now(), -offset)).copied();
            assert_eq!(total, Some(100 + offset - 1), "offset {offset}");
        }
    }

    #[tokio::test]
    async fn advance_week_preserves_values_and_identifier() {
        let pool = test_pool().await;
        seed_offsets(&pool, "p1", 0..11).await;
        seed_offsets(&pool, "p2", [0, 3].into_iter()).await;

        let before_p1: Vec<i64> = {
            let mut v = Vec::new();
            for o in 0..11 {
                v.push(weekly_total(&pool, "p1", o, now()).await.unwrap());
            }
            v
        };
        let rolling_before = rolling_total(&pool, "p1", 11, now()).await.unwrap();

        WeekRotationEngine::new(pool.clone())
            .advance_week("admin", now())
            .await
            .unwrap();

        for (o, expected) in before_p1.iter().enumerate() {
            let after = weekly_total(&pool, "p1", o as i64 + 1, now()).await.unwrap();
            assert_eq!(after, *expected);
        }
        assert_eq!(weekly_total(&pool, "p1", 0, now()).await.unwrap(), 0);
        // offset 1..=11 합계 = 전환 전 offset 0..=10 합계
        let rolling_after = rolling_total(&pool, "p1", 12, now()).await.unwrap();
        assert_eq!(rolling_after, rolling_before);

        assert_eq!(weekly_total(&pool, "p2", 1, now()).await.unwrap(), 100);
        assert_eq!(weekly_total(&pool, "p2", 4, now()).await.unwrap(), 103);

        let entries = db::list_entries_for_week(&pool, week_key_offset(now(), -1))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        let mut conn = pool.acquire().await.unwrap();
        let p2 = db::delete_all_for_person(&mut conn, "p2").await.unwrap();
        assert!(p2.iter().all(|e| e.external_identifier == "lic:p2"));
    }

    #[tokio::test]
    async fn clock_outs_after_rotation_land_in_the_current_week() {
        let pool = test_pool().await;
        seed_offsets(&pool, "p1", 0..1).await;
        WeekRotationEngine::new(pool.clone())
            .advance_week("admin", now())
            .await
            .unwrap();

        db::add_duration(&pool, "p1", "lic:p1", week_key_of(now()), 30)
            .await
            .unwrap();

        assert_eq!(weekly_total(&pool, "p1", 0, now()).await.unwrap(), 30);
        assert_eq!(weekly_total(&pool, "p1", 1, now()).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn partial_failure_leaves_no_record_and_keeps_committed_persons_rotated() {
        let pool = test_pool().await;
        seed_offsets(&pool, "good", 0..1).await;
        seed_offsets(&pool, "bad", 0..1).await;
        // "bad"의 재기록만 실패하게 만듭니다.
        sqlx::query(
            r#"
            CREATE TRIGGER reject_bad BEFORE INSERT ON hours
            WHEN NEW.person_key = 'bad'
            BEGIN SELECT RAISE(ABORT, 'rejected'); END
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let engine = WeekRotationEngine::new(pool.clone());
        let err = engine.advance_week("admin", now()).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
        assert!(db::list_rotations(&pool, 10).await.unwrap().is_empty());

        // "bad"는 롤백되어 그대로, "good"은 이미 한 주 밀렸습니다.
        assert_eq!(weekly_total(&pool, "bad", 0, now()).await.unwrap(), 100);
        assert_eq!(weekly_total(&pool, "good", 1, now()).await.unwrap(), 100);

        // 그대로 다시 호출하면 "good"은 한 주 더 밀립니다.
        sqlx::query("DROP TRIGGER reject_bad")
            .execute(&pool)
            .await
            .unwrap();
        engine.advance_week("admin", now()).await.unwrap();
        assert_eq!(weekly_total(&pool, "good", 2, now()).await.unwrap(), 100);
        assert_eq!(weekly_total(&pool, "bad", 1, now()).await.unwrap(), 100);
        assert_eq!(db::list_rotations(&pool, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn advance_week_on_empty_ledger_still_records_rotation() {
        let pool = test_pool().await;
        let outcome = WeekRotationEngine::new(pool.clone())
            .advance_week("admin", now())
            .await
            .unwrap();

        assert_eq!(outcome.persons_rotated, 0);
        assert_eq!(db::list_rotations(&pool, 10).await.unwrap().len(), 1);
    }

    async fn person_total(pool: &SqlitePool, person: &str) -> i64 {
        db::get_window(pool, person, 12).await.unwrap().values().sum()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn increments_racing_a_rotation_are_conserved() {
        let (_dir, pool) = file_pool().await;
        let persons: Vec<String> = (0..40).map(|i| format!("p{i:02}")).collect();
        for person in &persons {
            // offset 0과 5만 채워 전환 후에도 모두 보존 범위 안에 있게 합니다.
            seed_offsets(&pool, person, [0, 5].into_iter()).await;
        }
        let seeded: i64 = 40 * (100 + 105);

        let engine = Arc::new(WeekRotationEngine::new(pool.clone()));
        let rotation = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.advance_week("admin", now()).await })
        };

        let mut adds = JoinSet::new();
        for i in 0..400 {
            let pool = pool.clone();
            let person = persons[i % persons.len()].clone();
            adds.spawn(async move {
                db::add_duration(&pool, &person, &format!("lic:{person}"), week_key_of(now()), 3)
                    .await
            });
        }
        while let Some(res) = adds.join_next().await {
            res.unwrap().unwrap();
        }

        let outcome = rotation.await.unwrap().unwrap();
        assert_eq!(outcome.persons_rotated, 40);
        assert_eq!(outcome.entries_dropped, 0);

        let mut total = 0;
        for person in &persons {
            total += person_total(&pool, person).await;
        }
        assert_eq!(total, seeded + 400 * 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_see_either_old_or_new_layout_during_rotation() {
        let (_dir, pool) = file_pool().await;
        for i in 0..20 {
            seed_offsets(&pool, &format!("p{i:02}"), 0..12).await;
        }
        let before = db::get_window(&pool, "p00", 12).await.unwrap();

        let engine = Arc::new(WeekRotationEngine::new(pool.clone()));
        let rotation = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.advance_week("admin", now()).await })
        };

        let mut snapshots = Vec::new();
        while !rotation.is_finished() {
            snapshots.push(db::get_window(&pool, "p00", 12).await.unwrap());
            tokio::task::yield_now().await;
        }
        rotation.await.unwrap().unwrap();

        let after = db::get_window(&pool, "p00", 12).await.unwrap();
        assert_ne!(before, after);
        assert_eq!(after.len(), 11);
        for snapshot in &snapshots {
            assert!(
                *snapshot == before || *snapshot == after,
                "torn read: {snapshot:?}"
            );
        }
    }
}
