//! # テスト用モックトランスポート
//!
//! サービステストで使用するインメモリのモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! fashionforward-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
    Arc,
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use fashionforward_domain::notification::{MailMessage, NotificationError};

use crate::notification::MailTransport;

/// モックの振る舞い
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// 送信・疎通確認とも成功する
    Deliver,
    /// 指定したメッセージの接続エラーで失敗する
    Fail(String),
    /// 完了しない（タイムアウトの検証用）
    Hang,
}

// ===== MockMailTransport =====

/// 送信されたメッセージを記録するモックトランスポート
///
/// `Clone` したインスタンス同士は記録を共有する。
#[derive(Clone)]
pub struct MockMailTransport {
    behavior:      MockBehavior,
    sent:          Arc<Mutex<Vec<MailMessage>>>,
    verifications: Arc<AtomicUsize>,
}

impl MockMailTransport {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            sent: Arc::new(Mutex::new(Vec::new())),
            verifications: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delivering() -> Self {
        Self::new(MockBehavior::Deliver)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fail(message.into()))
    }

    pub fn hanging() -> Self {
        Self::new(MockBehavior::Hang)
    }

    /// 送信を受け付けたメッセージ（失敗・タイムアウトしたものも含む）
    pub fn sent_messages(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// `verify` が呼ばれた回数
    pub fn verification_count(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }

    async fn settle<T>(&self, value: T) -> Result<T, NotificationError> {
        match &self.behavior {
            MockBehavior::Deliver => Ok(value),
            MockBehavior::Fail(message) => Err(NotificationError::ConnectionFailed(message.clone())),
            MockBehavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<String, NotificationError> {
        let message_id = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(message.clone());
            format!("<mock-{}@fashionforward.test>", sent.len())
        };
        self.settle(message_id).await
    }

    async fn verify(&self) -> Result<(), NotificationError> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        self.settle(()).await
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use fashionforward_domain::notification::SenderIdentity;

    use super::*;

    fn make_message() -> MailMessage {
        MailMessage {
            from:      SenderIdentity::new("Fashion Forward", "noreply@fashionforward.com"),
            to:        "alice@example.com".to_string(),
            subject:   "Welcome to Fashion Forward!".to_string(),
            html_body: "<p>Hi</p>".to_string(),
            text_body: "Hi".to_string(),
        }
    }

    #[tokio::test]
    async fn deliverは連番のmessage_idを返す() {
        let transport = MockMailTransport::delivering();

        let first = transport.send(&make_message()).await.unwrap();
        let second = transport.send(&make_message()).await.unwrap();

        assert_eq!(first, "<mock-1@fashionforward.test>");
        assert_eq!(second, "<mock-2@fashionforward.test>");
        assert_eq!(transport.sent_messages().len(), 2);
    }

    #[tokio::test]
    async fn failは接続エラーを返しつつ記録する() {
        let transport = MockMailTransport::failing("relay refused");

        let result = transport.send(&make_message()).await;

        assert_eq!(
            result,
            Err(NotificationError::ConnectionFailed("relay refused".to_string()))
        );
        assert_eq!(transport.sent_messages().len(), 1);
    }

    #[test]
    fn cloneしたモックは記録を共有する() {
        let transport = MockMailTransport::delivering();
        let clone = transport.clone();

        tokio_test::block_on(clone.verify()).unwrap();

        assert_eq!(transport.verification_count(), 1);
    }
}
