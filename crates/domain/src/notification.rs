//! # 通知
//!
//! トランザクションメールに関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`MailMessage`] | メールメッセージ | 1 回の送信で組み立てられる送信単位 |
//! | [`OneTimePasscode`] | OTP | 呼び出し元が発行したワンタイムコード。本クレートは描画と転送のみ |
//! | [`SendResult`] | 送信結果 | 成功 / 失敗と、OTP 送信失敗時のフォールバック値 |
//! | [`NotificationKind`] | 通知種別 | OTP、リセットリンク、ウェルカムの 3 種類 |
//!
//! ## 設計方針
//!
//! - **失敗は値で返す**: 送信失敗は [`SendResult`] に変換され、呼び出し元に伝播しない
//! - **OTP は必ず呼び出し元へ戻す**: 送信できなかった場合も `fallbackOTP` で返し、
//!   リセットフローが行き止まりにならないようにする

mod transport;

use std::time::Duration;

use derive_more::{Display, From};
use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;
pub use transport::{
    ConnectionLimits,
    DEFAULT_SMTP_HOST,
    DEFAULT_SMTP_PORT,
    DEFAULT_TIMEOUT,
    ProviderProfile,
    SENDGRID_HOST,
    SENDGRID_LOGIN,
    SENDGRID_PORT,
    SmtpCredentials,
    TransportConfig,
    TransportTimeouts,
};

/// 通知送信エラー
///
/// `Display` は呼び出し元（ストアフロント UI）にそのまま返されるため英語で記述する。
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationError {
    /// 認証情報が未設定、またはプレースホルダのまま
    #[error("Email service not configured")]
    NotConfigured,

    /// 送信・疎通確認が制限時間内に終わらなかった
    #[error("{operation} timeout after {seconds} seconds")]
    Timeout {
        operation: &'static str,
        seconds:   u64,
    },

    /// SMTP 認証に失敗（530 / 534 / 535）
    #[error("SMTP authentication failed: {0}")]
    AuthenticationFailed(String),

    /// SMTP サーバーが応答コード付きで拒否した
    #[error("SMTP server rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// 接続・TLS・I/O の失敗
    #[error("SMTP connection failed: {0}")]
    ConnectionFailed(String),

    /// 送信元または宛先アドレスが不正
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// メッセージの組み立てに失敗
    #[error("Failed to build email message: {0}")]
    MessageBuild(String),

    /// テンプレートレンダリングに失敗
    #[error("Failed to render email template: {0}")]
    TemplateFailed(String),
}

impl NotificationError {
    /// タイムアウトエラーを生成する
    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout {
            operation,
            seconds: after.as_secs(),
        }
    }

    /// ログの `error.kind` フィールドに出力する種別名
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// 通知種別
///
/// ログの `notification.kind` フィールドに snake_case で出力される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// パスワードリセット OTP
    PasswordResetOtp,
    /// パスワードリセットリンク
    PasswordResetLink,
    /// ウェルカムメール
    Welcome,
}

/// ワンタイムパスコード
///
/// 呼び出し元が発行・保存・検証する不透明な文字列。
/// 本クレートはテンプレートへの埋め込みとフォールバック返却のみを行う。
#[derive(Debug, Clone, PartialEq, Eq, Display, From, Serialize)]
#[serde(transparent)]
pub struct OneTimePasscode(String);

impl OneTimePasscode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 送信元の表示名とアドレス
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{name} <{address}>")]
pub struct SenderIdentity {
    pub name:    String,
    pub address: String,
}

impl SenderIdentity {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            address: address.into(),
        }
    }

    /// アドレスのドメイン部（`@` 以降）
    ///
    /// `@` を含まない場合は `None`。
    pub fn domain(&self) -> Option<&str> {
        self.address
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
    }
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。`MailTransport` に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// 送信元
    pub from:      SenderIdentity,
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 送信結果
///
/// 呼び出し元には JSON（`success`, `messageId`, `error`, `fallbackOTP`）として返される。
/// 値のないフィールドはキーごと省略する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub success:      bool,
    /// プロバイダ側で追跡できるメッセージ ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id:   Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:        Option<String>,
    /// OTP 送信に失敗した場合のみ設定される
    #[serde(rename = "fallbackOTP", skip_serializing_if = "Option::is_none")]
    pub fallback_otp: Option<OneTimePasscode>,
}

impl SendResult {
    /// 送信成功
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
            fallback_otp: None,
        }
    }

    /// 送信失敗
    pub fn failed(error: &NotificationError) -> Self {
        Self {
            success:      false,
            message_id:   None,
            error:        Some(error.to_string()),
            fallback_otp: None,
        }
    }

    /// 失敗結果に OTP を添える
    pub fn with_fallback(mut self, code: OneTimePasscode) -> Self {
        self.fallback_otp = Some(code);
        self
    }
}
