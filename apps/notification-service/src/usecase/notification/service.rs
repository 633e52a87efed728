//! # 通知サービス
//!
//! テンプレートレンダリング → 制限時間付きメール送信 → 結果の構造化を統合するサービス。
//!
//! ## 設計方針
//!
//! - **失敗は値で返す**: 送信系の操作はすべて [`SendResult`] を返し、パニックもエラーも伝播しない
//! - **OTP は必ず戻す**: OTP 送信の失敗時（未設定を含む）は `fallbackOTP` にコードを入れる
//! - **タグ付きトランスポート**: 未設定は [`Transport::Disabled`] で表し、null チェックしない
//!
//! ## 制限時間
//!
//! 疎通確認は 10 秒、OTP / リセットリンク送信は 15 秒で打ち切る。ウェルカムメールは
//! トランスポート自身のタイムアウトに任せる。
//!
//! 打ち切り時は送信中の future を破棄して呼び出し元に結果を返す。クライアント側の
//! 処理は止まるが、リレーがすでにメッセージを受理している可能性は排除できない。

use std::{future::Future, sync::Arc, time::Duration};

use fashionforward_domain::notification::{
    MailMessage,
    NotificationError,
    NotificationKind,
    OneTimePasscode,
    SendResult,
    SenderIdentity,
};
use fashionforward_infra::notification::{MailTransport, SmtpMailTransport};
use fashionforward_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::{RenderedEmail, TemplateRenderer};
use crate::config::{DisabledReason, NotificationConfig, TransportSetting};

/// 表示名が省略されたときの呼びかけ
pub const DEFAULT_DISPLAY_NAME: &str = "User";
/// 疎通確認の制限時間
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);
/// OTP / リセットリンク送信の制限時間
pub const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// 送信トランスポート
#[derive(Clone)]
pub enum Transport {
    /// 未設定（フォールバックモード）
    Disabled { reason: DisabledReason },
    /// 送信可能
    Configured(Arc<dyn MailTransport>),
}

/// 通知サービス
///
/// 起動時に 1 つ作り、複数のリクエストから共有する。状態は不変。
pub struct NotificationSender {
    transport:         Transport,
    template_renderer: TemplateRenderer,
    sender:            SenderIdentity,
    frontend_url:      String,
}

impl NotificationSender {
    pub fn new(
        transport: Transport,
        template_renderer: TemplateRenderer,
        sender: SenderIdentity,
        frontend_url: String,
    ) -> Self {
        Self {
            transport,
            template_renderer,
            sender,
            frontend_url,
        }
    }

    /// 設定からサービスを作成する
    ///
    /// 解決済みの設定（[`NotificationConfig::log_summary`]）をログに出力してから構築する。
    /// トランスポートを構築できない場合はエラーにせずフォールバックモードにする。
    /// エラーになるのはテンプレートの初期化に失敗した場合のみ。
    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotificationError> {
        config.log_summary();

        let transport = match &config.transport {
            TransportSetting::Disabled(reason) => Transport::Disabled {
                reason: reason.clone(),
            },
            TransportSetting::Configured(transport_config) => {
                match SmtpMailTransport::from_config(transport_config) {
                    Ok(smtp) => Transport::Configured(Arc::new(smtp)),
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            error.category = error::category::CONFIGURATION,
                            error.kind = e.kind(),
                            host = %transport_config.host,
                            "SMTP トランスポートの構築に失敗。フォールバックモードで動作します"
                        );
                        Transport::Disabled {
                            reason: DisabledReason::TransportUnavailable(e.to_string()),
                        }
                    }
                }
            }
        };

        Ok(Self::new(
            transport,
            TemplateRenderer::new()?,
            config.sender.clone(),
            config.frontend_url.clone(),
        ))
    }

    /// 送信可能なトランスポートを持っているか
    pub fn is_configured(&self) -> bool {
        matches!(self.transport, Transport::Configured(_))
    }

    /// リレーとの疎通を確認する（ベストエフォート）
    ///
    /// 未設定なら即座に戻る。失敗してもログに残すだけで、以降の送信には影響しない。
    pub async fn verify_connection(&self) {
        let Transport::Configured(transport) = &self.transport else {
            return;
        };

        match bounded(transport.verify(), VERIFY_TIMEOUT, "Connection").await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::TRANSPORT_VERIFIED,
                    event.result = event::result::SUCCESS,
                    provider = transport.provider_name(),
                    "メール送信サービスに接続できました"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = e.kind(),
                    provider = transport.provider_name(),
                    "メール送信サービスの接続確認に失敗しました。送信は引き続き試行します"
                );
                tracing::info!(
                    "考えられる原因: (1) クラウド環境からの SMTP 接続がプロバイダにブロックされている \
                     (2) アプリパスワードが誤っている (3) ネットワーク制限"
                );
            }
        }
    }

    /// パスワードリセット OTP を送信する
    ///
    /// `display_name` が `None` の場合のみ `"User"` を使う（空文字列はそのまま）。
    /// 失敗時（未設定・タイムアウト・送信エラー）は必ず `fallback_otp` にコードを入れて返す。
    pub async fn send_password_reset_otp(
        &self,
        recipient: &str,
        code: &OneTimePasscode,
        display_name: Option<&str>,
    ) -> SendResult {
        let kind = NotificationKind::PasswordResetOtp;
        let display_name = display_name.unwrap_or(DEFAULT_DISPLAY_NAME);

        let outcome = match self
            .template_renderer
            .render_password_reset_otp(display_name, code)
        {
            Ok(rendered) => self.deliver(kind, recipient, rendered, Some(SEND_TIMEOUT)).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(message_id) => SendResult::delivered(Some(message_id)),
            Err(e) => {
                self.log_failure(kind, recipient, &e);
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FALLBACK,
                    event.result = event::result::FAILURE,
                    notification.kind = %kind,
                    notification.recipient = %recipient,
                    otp = %code,
                    "パスワードリセット OTP（フォールバック）"
                );
                SendResult::failed(&e).with_fallback(code.clone())
            }
        }
    }

    /// パスワードリセットリンクを送信する
    ///
    /// OTP と同じく 15 秒で打ち切る。フォールバック値は持たない。
    pub async fn send_password_reset_link(
        &self,
        recipient: &str,
        reset_url: &str,
        display_name: Option<&str>,
    ) -> SendResult {
        let kind = NotificationKind::PasswordResetLink;
        let display_name = display_name.unwrap_or(DEFAULT_DISPLAY_NAME);

        let rendered = self
            .template_renderer
            .render_password_reset_link(display_name, reset_url);
        self.finish(kind, recipient, rendered, Some(SEND_TIMEOUT))
            .await
    }

    /// ウェルカムメールを送信する
    ///
    /// 制限時間はトランスポートのタイムアウトに任せる。失敗はログに残すのみ。
    pub async fn send_welcome_email(&self, recipient: &str, display_name: &str) -> SendResult {
        let kind = NotificationKind::Welcome;

        let rendered = self
            .template_renderer
            .render_welcome(display_name, &self.frontend_url);
        self.finish(kind, recipient, rendered, None).await
    }

    /// フォールバック値を持たない送信の共通処理
    async fn finish(
        &self,
        kind: NotificationKind,
        recipient: &str,
        rendered: Result<RenderedEmail, NotificationError>,
        limit: Option<Duration>,
    ) -> SendResult {
        let outcome = match rendered {
            Ok(rendered) => self.deliver(kind, recipient, rendered, limit).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(message_id) => SendResult::delivered(Some(message_id)),
            Err(e) => {
                self.log_failure(kind, recipient, &e);
                SendResult::failed(&e)
            }
        }
    }

    /// メッセージを組み立てて 1 回だけ送信する
    async fn deliver(
        &self,
        kind: NotificationKind,
        recipient: &str,
        rendered: RenderedEmail,
        limit: Option<Duration>,
    ) -> Result<String, NotificationError> {
        let transport = match &self.transport {
            Transport::Configured(transport) => transport,
            Transport::Disabled { .. } => return Err(NotificationError::NotConfigured),
        };

        let message = MailMessage {
            from:      self.sender.clone(),
            to:        recipient.to_string(),
            subject:   rendered.subject,
            html_body: rendered.html_body,
            text_body: rendered.text_body,
        };

        let message_id = match limit {
            Some(limit) => bounded(transport.send(&message), limit, "Email send").await?,
            None => transport.send(&message).await?,
        };

        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_SENT,
            event.result = event::result::SUCCESS,
            notification.kind = %kind,
            notification.recipient = %recipient,
            notification.message_id = %message_id,
            provider = transport.provider_name(),
            "通知メール送信成功"
        );

        Ok(message_id)
    }

    fn log_failure(&self, kind: NotificationKind, recipient: &str, e: &NotificationError) {
        match (&self.transport, e) {
            (Transport::Disabled { reason }, NotificationError::NotConfigured) => {
                tracing::info!(
                    notification.kind = %kind,
                    reason = ?reason,
                    "メール送信は未設定のためスキップしました"
                );
            }
            _ => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.result = event::result::FAILURE,
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = e.kind(),
                    notification.kind = %kind,
                    notification.recipient = %recipient,
                    error = %e,
                    "通知メール送信失敗"
                );
            }
        }
    }
}

/// future を制限時間付きで待つ
///
/// 制限時間を過ぎた場合は future を破棄して [`NotificationError::Timeout`] を返す。
async fn bounded<T>(
    future: impl Future<Output = Result<T, NotificationError>>,
    limit: Duration,
    operation: &'static str,
) -> Result<T, NotificationError> {
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(NotificationError::timeout(operation, limit)),
    }
}
