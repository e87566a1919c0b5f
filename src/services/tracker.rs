//! # 출퇴근 세션 추적기 (SessionTracker)
//!
//! `(person_key, external_identifier)`마다 진행 중인 근무 세션을 메모리에 보관합니다.
//!
//! ## 상태 전이
//! ```text
//! IDLE ──clock-in──▶ ON_DUTY ──clock-out──▶ IDLE
//!                     │  ▲
//!                     └──┘ clock-in (시작 시각 덮어쓰기, 경고)
//! ```
//! IDLE 상태에서의 퇴근은 `NoActiveSession` 에러이며 원장에는 아무것도 쓰지 않습니다.
//!
//! 세션 자체는 저장하지 않고, 퇴근 시점에 계산된 근무 시간만 원장에 커밋합니다.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::models::{ClockIn, CommittedSession};
use crate::services::week::week_key_of;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    person_key: String,
    external_identifier: String,
}

impl SessionKey {
    fn new(person_key: &str, external_identifier: &str) -> Self {
        Self {
            person_key: person_key.to_string(),
            external_identifier: external_identifier.to_string(),
        }
    }
}

/// 진행 중인 세션 목록과 원장 커밋을 담당합니다.
///
/// 잠금은 맵을 읽고 쓰는 짧은 구간에만 잡고, DB 작업 중에는 잡지 않습니다.
pub struct SessionTracker {
    pool: SqlitePool,
    open: Mutex<HashMap<SessionKey, DateTime<Utc>>>,
}

impl SessionTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            open: Mutex::new(HashMap::new()),
        }
    }

    /// 출근: 세션 시작 시각을 기록합니다. 원장에는 영향이 없습니다.
    ///
    /// 이미 근무 중이면 시작 시각을 덮어쓰고 `reopened = true`를 반환합니다.
    pub fn on_clock_in(
        &self,
        person_key: &str,
        external_identifier: &str,
        timestamp: DateTime<Utc>,
    ) -> ClockIn {
        let previous = self
            .sessions()
            .insert(SessionKey::new(person_key, external_identifier), timestamp);

        if let Some(started) = previous {
            tracing::warn!(
                person_key,
                external_identifier,
                %started,
                "Clock-in while already on duty; restarting session"
            );
        }

        ClockIn {
            reopened: previous.is_some(),
        }
    }

    /// 퇴근: 세션 시간을 계산해 원장에 더하고, 커밋 결과를 반환합니다.
    ///
    /// - 근무 시간 = `max(0, timestamp - 시작 시각)`
    /// - 주차 = 퇴근 시각이 속한 ISO 주
    ///
    /// 원장 기록이 실패하면 세션을 되돌려 놓아 호출자가 재시도할 수 있게 합니다.
    pub async fn on_clock_out(
        &self,
        person_key: &str,
        external_identifier: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<CommittedSession, AppError> {
        let key = SessionKey::new(person_key, external_identifier);
        let started = self
            .sessions()
            .remove(&key)
            .ok_or_else(|| AppError::NoActiveSession {
                person_key: person_key.to_string(),
                external_identifier: external_identifier.to_string(),
            })?;

        let session_seconds = (timestamp - started).num_seconds().max(0);
        let week_key = week_key_of(timestamp);

        let new_week_total = match db::add_duration(
            &self.pool,
            person_key,
            external_identifier,
            week_key,
            session_seconds,
        )
        .await
        {
            Ok(total) => total,
            Err(e) => {
                // 그 사이 새로 출근했다면 그 세션을 우선합니다.
                self.sessions().entry(key).or_insert(started);
                return Err(e);
            }
        };

        tracing::info!(
            person_key,
            %week_key,
            session_seconds,
            new_week_total,
            "Session committed"
        );

        Ok(CommittedSession {
            person_key: person_key.to_string(),
            external_identifier: external_identifier.to_string(),
            week_key,
            session_seconds,
            new_week_total,
        })
    }

    /// 현재 근무 중인지 확인합니다.
    pub fn is_on_duty(&self, person_key: &str, external_identifier: &str) -> bool {
        self.sessions()
            .contains_key(&SessionKey::new(person_key, external_identifier))
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionKey, DateTime<Utc>>> {
        // 맵 갱신은 한 번의 insert/remove라 패닉 후에도 내용이 일관됩니다.
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn clock_out_commits_session_length() {
        let pool = test_pool().await;
        let tracker = SessionTracker::new(pool.clone());

        let clock_in = tracker.on_clock_in("p1", "lic:1", ts(1000));
        assert!(!clock_in.reopened);
        assert!(tracker.is_on_duty("p1", "lic:1"));

        let committed = tracker.on_clock_out("p1", "lic:1", ts(4600)).await.unwrap();
        assert_eq!(committed.session_seconds, 3600);
        assert_eq!(committed.new_week_total, 3600);
        assert_eq!(committed.week_key, week_key_of(ts(4600)));
        assert!(!tracker.is_on_duty("p1", "lic:1"));

        let window = db::get_window(&pool, "p1", 12).await.unwrap();
        assert_eq!(window.get(&committed.week_key), Some(&3600));
    }

    #[tokio::test]
    async fn clock_out_without_clock_in_writes_nothing() {
        let pool = test_pool().await;
        let tracker = SessionTracker::new(pool.clone());

        let err = tracker.on_clock_out("p1", "lic:1", ts(4600)).await.unwrap_err();
        assert!(matches!(err, AppError::NoActiveSession { .. }));
        assert!(db::list_person_keys(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sessions_are_keyed_by_external_identifier_too() {
        let pool = test_pool().await;
        let tracker = SessionTracker::new(pool);

        tracker.on_clock_in("p1", "lic:1", ts(1000));
        let err = tracker.on_clock_out("p1", "lic:2", ts(2000)).await.unwrap_err();
        assert!(matches!(err, AppError::NoActiveSession { .. }));
        assert!(tracker.is_on_duty("p1", "lic:1"));
    }

    #[tokio::test]
    async fn reopen_overwrites_start_time() {
        let pool = test_pool().await;
        let tracker = SessionTracker::new(pool);

        tracker.on_clock_in("p1", "lic:1", ts(1000));
        assert!(tracker.on_clock_in("p1", "lic:1", ts(3000)).reopened);

        let committed = tracker.on_clock_out("p1", "lic:1", ts(4000)).await.unwrap();
        assert_eq!(committed.session_seconds, 1000);
    }

    #[tokio::test]
    async fn clock_out_before_clock_in_counts_as_zero() {
        let pool = test_pool().await;
        let tracker = SessionTracker::new(pool);

        tracker.on_clock_in("p1", "lic:1", ts(5000));
        let committed = tracker.on_clock_out("p1", "lic:1", ts(4000)).await.unwrap();
        assert_eq!(committed.session_seconds, 0);
        assert_eq!(committed.new_week_total, 0);
    }

    #[tokio::test]
    async fn sessions_in_the_same_week_accumulate() {
        let pool = test_pool().await;
        let tracker = SessionTracker::new(pool);

        tracker.on_clock_in("p1", "lic:1", ts(1000));
        tracker.on_clock_out("p1", "lic:1", ts(2000)).await.unwrap();
        tracker.on_clock_in("p1", "lic:1", ts(3000));
        let committed = tracker.on_clock_out("p1", "lic:1", ts(3500)).await.unwrap();

        assert_eq!(committed.session_seconds, 500);
        assert_eq!(committed.new_week_total, 1500);
    }
}
