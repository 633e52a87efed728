//! # メールトランスポート
//!
//! SMTP リレーへのメール送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait でメール送信を抽象化
//! - **実装**: SMTP（lettre）。テストでは `mock::MockMailTransport` を使う
//! - **タイムアウトは呼び出し側**: 送信全体の制限時間は通知サービスが決める

mod smtp;

use async_trait::async_trait;
use fashionforward_domain::notification::{MailMessage, NotificationError};
pub use smtp::SmtpMailTransport;

/// メールトランスポートトレイト
///
/// 実装は複数の呼び出し元から同時に使われる。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// メールを 1 通送信し、メッセージ ID を返す
    async fn send(&self, message: &MailMessage) -> Result<String, NotificationError>;

    /// リレーとのハンドシェイク（認証まで）を行う
    async fn verify(&self) -> Result<(), NotificationError>;

    /// ログ用のプロバイダ名
    fn provider_name(&self) -> &'static str;
}
