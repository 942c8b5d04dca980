use adapter::store::open_store_with;
use anyhow::{Context, Result};
use api::route::{health::build_health_check_routers, v1};
use axum::Router;
use chrono::Local;
use kernel::model::session::should_show_link;
use registry::AppRegistry;
use shared::config::AppConfig;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;

use shared::env::{which, Environment};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    bootstrap().await
}

fn init_logger() -> Result<()> {
    let log_level = match which() {
        Environment::Development => "debug",
        Environment::Production => "info",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());

    let subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(subscriber)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

async fn bootstrap() -> Result<()> {
    let app_config = AppConfig::new()?;
    let store = open_store_with(&app_config.storage);
    let ticker_interval = Duration::from_secs(app_config.session.ticker_interval_secs);

    let registry = AppRegistry::new(store);

    // セッション時間帯の再分類ループ。データ変更ではなくクロックが
    // 境界をまたぐことがイベントなので、明示的な周期タスクとして持つ
    {
        let registry = registry.clone();
        tokio::spawn(async move {
            session_window_loop(registry, ticker_interval).await;
        });
    }

    let app = Router::new()
        .merge(build_health_check_routers())
        .merge(v1::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(registry);

    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 8080);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .await
        .context("Unexpected error happened in server")
        .inspect_err(|e| {
            tracing::error!(
                error.cause_chain = ?e,error.message = %e, "Unexpected error"
            )
        })
}

// 各チャットの「いまミーティングリンクを表示すべきか」を再評価し、
// 可視状態が切り替わったチャットを記録する。周期のほか、予約リクエストの
// 変更通知でも前倒しで再評価する
async fn session_window_loop(registry: AppRegistry, interval: Duration) {
    let mut bookings = registry.booking_request_repository().subscribe();
    // 前回の可視状態。切り替わりの検出に使う
    let mut visible: HashMap<String, bool> = HashMap::new();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            event = bookings.next() => {
                if event.is_none() {
                    // ストアが閉じられたのでループを畳む
                    return;
                }
            }
        }

        let settings = match registry.chat_repository().find_all_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                // 読み取り側の失敗は空表示へのフォールバックと同じ扱い
                tracing::warn!(error = %e, "failed to load chat settings for window evaluation");
                continue;
            }
        };

        let now = Local::now().naive_local();
        for chat in settings {
            let requests = match registry
                .booking_request_repository()
                .find_by_chat_id(chat.chat_id)
                .await
            {
                Ok(requests) => requests,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        chat_id = %chat.chat_id,
                        "failed to load booking requests for window evaluation"
                    );
                    continue;
                }
            };

            let now_visible = should_show_link(&chat, &requests, now);
            let before = visible
                .insert(chat.chat_id.to_string(), now_visible)
                .unwrap_or(false);
            if before != now_visible {
                tracing::info!(
                    chat_id = %chat.chat_id,
                    visible = now_visible,
                    "meeting link visibility changed"
                );
            }
        }
    }
}
