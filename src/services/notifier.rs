//! # 알림 발송기 (Notifier)
//!
//! 원장 커밋 결과를 외부 알림(DM, 웹훅 등)으로 넘기는 통로입니다.
//! 원장 쓰기와 알림 전송을 분리하기 위해 `tokio::sync::mpsc` 채널을 사용합니다:
//!
//! ```text
//! 핸들러 ──send()──▶ [unbounded 채널] ──▶ 백그라운드 태스크 ──▶ 로그/외부 전송
//! ```
//!
//! `send()`는 기다리지 않고 즉시 반환하며, 실패해도 호출자에게 에러를 돌려주지 않습니다.
//! 알림이 실패했다고 이미 커밋된 원장 기록이 되돌려지는 일은 없습니다.

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::models::{CommittedSession, Milestone, RotationRecord};

/// 알림 이벤트
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    ClockedIn {
        person_key: String,
        name: Option<String>,
        timestamp: i64,
        reopened: bool,
    },
    ClockedOut {
        name: Option<String>,
        session: CommittedSession,
        percent: u32,
        milestone: Option<Milestone>,
    },
    WeekAdvanced {
        record: RotationRecord,
    },
}

/// 알림 채널의 송신 쪽. `Clone`이므로 `AppState`에 그대로 넣습니다.
#[derive(Clone)]
pub struct Notifier {
    tx: UnboundedSender<Notification>,
}

impl Notifier {
    /// 채널과 수신 쪽을 함께 만듭니다. 수신 쪽은 호출자가 직접 소비합니다.
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// 받은 알림을 로그로 남기는 백그라운드 태스크를 띄웁니다.
    pub fn spawn_logging() -> Self {
        let (notifier, rx) = Self::channel();
        tokio::spawn(deliver(rx));
        notifier
    }

    /// 알림을 보냅니다 (fire-and-forget).
    pub fn send(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            tracing::warn!("Notification channel closed; dropping {:?}", e.0);
        }
    }
}

async fn deliver(mut rx: UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        match serde_json::to_string(&notification) {
            Ok(payload) => tracing::info!(target: "staffhours::notify", "{}", payload),
            Err(e) => tracing::warn!("Failed to encode notification: {}", e),
        }
    }
    tracing::debug!("Notification channel drained");
}
