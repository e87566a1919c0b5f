//! # staffhours 서버 진입점
//!
//! 게임 서버의 출퇴근 이벤트를 받아 주간 근무시간 원장을 관리하는 HTTP 서버입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성 및 마이그레이션
//! 4. 알림 채널 생성
//! 5. API 라우터 설정
//! 6. HTTP 서버 시작

mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use config::Config;
use routes::*;
use services::Notifier;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일이 없어도 넘어갑니다.
    dotenvy::dotenv().ok();

    // RUST_LOG가 없으면 staffhours, tower_http, axum 모듈을 debug 레벨로 설정
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffhours=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    // 요구 시간이 잘못되었으면 첫 퇴근 요청이 아니라 시작 시점에 알립니다.
    config.required_seconds()?;
    tracing::info!("Starting staffhours server on {}:{}", config.host, config.port);

    let pool = db::connect(&config.database_url).await?;

    let notifier = Notifier::spawn_logging();
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(pool, config, notifier);

    let api_routes = Router::new()
        // 출퇴근 이벤트 (게임 서버)
        .route("/clock", post(clock))
        // 평가/승진 조회 (채팅 봇)
        .route("/evaluate/{person_key}", get(evaluate))
        .route("/totals/{person_key}", get(totals))
        .route("/promotions", get(promotions))
        // 주간 전환
        .route("/weeks/advance", post(advance_week))
        .route("/weeks/rotations", get(list_rotations))
        .route("/health", get(health_check))
        .with_state(state);

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
