//! # Notification Service 接続診断
//!
//! 通知設定を解決してログに出力し、SMTP リレーとの疎通を確認して終了する運用向けバイナリ。
//! 疎通確認の失敗はログに残すだけで、終了コードは 0 のまま。
//!
//! ## 起動方法
//!
//! ```bash
//! # .env の SMTP_* を読み込んで確認
//! cargo run -p fashionforward-notification-service
//!
//! # JSON ログで確認
//! LOG_FORMAT=json cargo run -p fashionforward-notification-service
//! ```

use fashionforward_notification_service::{NotificationConfig, NotificationSender};
use fashionforward_shared::observability::{TracingConfig, init_tracing};
use tracing::Instrument as _;

const SERVICE_NAME: &str = "notification-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env(SERVICE_NAME);
    init_tracing(&tracing_config);

    run()
        .instrument(tracing::info_span!(
            "app",
            service = %tracing_config.service_name
        ))
        .await
}

async fn run() -> anyhow::Result<()> {
    let config = NotificationConfig::from_env();
    let sender = NotificationSender::from_config(&config)?;
    if !sender.is_configured() {
        tracing::info!("フォールバックモードのため接続確認をスキップします");
        return Ok(());
    }

    sender.verify_connection().await;
    Ok(())
}
