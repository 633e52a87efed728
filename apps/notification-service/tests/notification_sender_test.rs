//! NotificationSender 統合テスト
//!
//! 環境変数の代わりにキー検索関数で設定を解決し、モックトランスポートで
//! 公開 API の振る舞いを検証する。ネットワークには接続しない。
//!
//! 実行方法:
//! ```bash
//! cargo test -p fashionforward-notification-service --test notification_sender_test
//! ```

use std::{collections::HashMap, sync::Arc, time::Duration};

use fashionforward_domain::notification::{OneTimePasscode, SenderIdentity};
use fashionforward_infra::mock::MockMailTransport;
use fashionforward_notification_service::{
    NotificationConfig,
    NotificationSender,
    TemplateRenderer,
    usecase::Transport,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn config_from(pairs: &[(&str, &str)]) -> NotificationConfig {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    NotificationConfig::from_lookup(|key| vars.get(key).cloned())
}

fn sender_with(transport: MockMailTransport) -> NotificationSender {
    NotificationSender::new(
        Transport::Configured(Arc::new(transport)),
        TemplateRenderer::new().unwrap(),
        SenderIdentity::new("Fashion Forward", "shop@fashionforward.com"),
        "https://shop.example.com".to_string(),
    )
}

#[tokio::test]
async fn 認証情報がなければすべての送信がフォールバックモードで失敗する() {
    let sender = NotificationSender::from_config(&config_from(&[])).unwrap();
    assert!(!sender.is_configured());

    let otp = sender
        .send_password_reset_otp("user@x.com", &OneTimePasscode::new("654321"), None)
        .await;
    let link = sender
        .send_password_reset_link("user@x.com", "https://shop.example.com/reset?t=1", None)
        .await;
    let welcome = sender.send_welcome_email("user@x.com", "Alice").await;

    assert_eq!(
        serde_json::to_value(&otp).unwrap(),
        json!({
            "success": false,
            "error": "Email service not configured",
            "fallbackOTP": "654321",
        })
    );
    for result in [link, welcome] {
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": false,
                "error": "Email service not configured",
            })
        );
    }
}

#[test]
fn sendgrid設定から送信可能なサービスを構築できる() {
    let config = config_from(&[
        ("SMTP_HOST", "smtp.sendgrid.net"),
        ("SMTP_USER", "shop@fashionforward.com"),
        ("SMTP_PASS", "SG.secret"),
    ]);

    let sender = NotificationSender::from_config(&config).unwrap();

    assert!(sender.is_configured());
}

#[test]
fn 汎用smtp設定から送信可能なサービスを構築できる() {
    let config = config_from(&[
        ("SMTP_HOST", "mail.example.com"),
        ("SMTP_PORT", "2525"),
        ("SMTP_USER", "shop@example.com"),
        ("SMTP_PASS", "app-pass"),
    ]);

    let sender = NotificationSender::from_config(&config).unwrap();

    assert!(sender.is_configured());
}

#[tokio::test]
async fn ウェルカムメール失敗のjsonにfallback_otpは含まれない() {
    let sender = sender_with(MockMailTransport::failing("relay refused"));

    let result = sender.send_welcome_email("user@x.com", "Alice").await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "success": false,
            "error": "SMTP connection failed: relay refused",
        })
    );
}

#[tokio::test]
async fn 送信成功のjsonはmessage_idを含む() {
    let transport = MockMailTransport::delivering();
    let sender = sender_with(transport.clone());

    let result = sender.send_welcome_email("user@x.com", "Alice").await;

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "success": true,
            "messageId": "<mock-1@fashionforward.test>",
        })
    );
    let sent = transport.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Welcome to Fashion Forward!");
    assert!(sent[0].html_body.contains("href=\"https://shop.example.com\""));
}

#[tokio::test(start_paused = true)]
async fn 応答しないリレーでもotp送信は時間内にフォールバックを返す() {
    let sender = sender_with(MockMailTransport::hanging());
    let started = tokio::time::Instant::now();

    let result = sender
        .send_password_reset_otp("user@x.com", &OneTimePasscode::new("123456"), Some("Alice"))
        .await;

    assert!(started.elapsed() < Duration::from_secs(16));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "success": false,
            "error": "Email send timeout after 15 seconds",
            "fallbackOTP": "123456",
        })
    );
}

#[tokio::test]
async fn 同じサービスを複数タスクから並行して使える() {
    let transport = MockMailTransport::delivering();
    let sender = Arc::new(sender_with(transport.clone()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let sender = Arc::clone(&sender);
            tokio::spawn(async move {
                sender
                    .send_password_reset_otp(
                        &format!("user{i}@x.com"),
                        &OneTimePasscode::new("111111"),
                        None,
                    )
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().success);
    }
    assert_eq!(transport.sent_messages().len(), 4);
}
