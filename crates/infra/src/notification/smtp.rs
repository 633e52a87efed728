//! SMTP トランスポート実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! Gmail 等の汎用リレーと SendGrid の両方をこの実装で扱う。

use async_trait::async_trait;
use fashionforward_domain::notification::{MailMessage, NotificationError, TransportConfig};
use lettre::{
    Address,
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::MailTransport;

/// 送信元アドレスにドメイン部がない場合の Message-ID ドメイン
const FALLBACK_MESSAGE_ID_DOMAIN: &str = "localhost";

/// SMTP トランスポート
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
/// 接続は再利用せず送信ごとに張るため、同時接続数はセマフォで制限する。
pub struct SmtpMailTransport {
    transport:     AsyncSmtpTransport<Tokio1Executor>,
    connections:   Semaphore,
    provider_name: &'static str,
}

impl SmtpMailTransport {
    /// 設定からトランスポートを作成する
    ///
    /// 接続はまだ張らない。TLS パラメータの構築に失敗した場合のみエラーになる。
    pub fn from_config(config: &TransportConfig) -> Result<Self, NotificationError> {
        let relay = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        };
        let builder = relay.map_err(|e| NotificationError::ConnectionFailed(e.to_string()))?;

        let credentials = Credentials::new(
            config.credentials.user().to_string(),
            config.credentials.secret().to_string(),
        );

        let mut builder = builder.port(config.port).credentials(credentials);
        if let Some(timeouts) = &config.timeouts {
            builder = builder.timeout(Some(timeouts.longest()));
        }

        if config.limits.pooled {
            tracing::warn!(
                host = %config.host,
                "接続プールは未対応のため、送信ごとに接続します"
            );
        }

        tracing::debug!(
            provider = %config.profile,
            host = %config.host,
            port = config.port,
            secure = config.secure,
            max_connections = config.limits.max_connections,
            "SMTP トランスポートを構築しました"
        );

        Ok(Self {
            transport:     builder.build(),
            connections:   Semaphore::new(config.limits.max_connections.max(1)),
            provider_name: config.profile.into(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<String, NotificationError> {
        let message_id = generate_message_id(message);
        let email = build_message(message, &message_id)?;

        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|e| NotificationError::ConnectionFailed(e.to_string()))?;

        self.transport.send(email).await.map_err(classify)?;

        Ok(message_id)
    }

    async fn verify(&self) -> Result<(), NotificationError> {
        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|e| NotificationError::ConnectionFailed(e.to_string()))?;

        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotificationError::ConnectionFailed(
                "SMTP server did not accept the connection".to_string(),
            )),
            Err(e) => Err(classify(e)),
        }
    }

    fn provider_name(&self) -> &'static str {
        self.provider_name
    }
}

/// `<uuid@送信元ドメイン>` 形式の Message-ID を生成する
fn generate_message_id(message: &MailMessage) -> String {
    let domain = message.from.domain().unwrap_or(FALLBACK_MESSAGE_ID_DOMAIN);
    format!("<{}@{}>", Uuid::now_v7(), domain)
}

/// text/plain と text/html の multipart/alternative メッセージを組み立てる
fn build_message(message: &MailMessage, message_id: &str) -> Result<Message, NotificationError> {
    let from_address: Address = message
        .from
        .address
        .parse()
        .map_err(|e| NotificationError::InvalidAddress(format!("{}: {e}", message.from.address)))?;
    let to_address: Address = message
        .to
        .parse()
        .map_err(|e| NotificationError::InvalidAddress(format!("{}: {e}", message.to)))?;

    Message::builder()
        .message_id(Some(message_id.to_string()))
        .from(Mailbox::new(Some(message.from.name.clone()), from_address))
        .to(Mailbox::new(None, to_address))
        .subject(&message.subject)
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(message.text_body.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(message.html_body.clone()),
                ),
        )
        .map_err(|e| NotificationError::MessageBuild(e.to_string()))
}

/// lettre のエラーを応答コードで分類する
///
/// 530 / 534 / 535 は認証系、それ以外の応答コード付きエラーは拒否、
/// 応答コードのないもの（接続・TLS・I/O）は接続失敗とする。
fn classify(error: lettre::transport::smtp::Error) -> NotificationError {
    let message = error.to_string();
    match error.status().map(|code| code.to_string()) {
        Some(code) if matches!(code.as_str(), "530" | "534" | "535") => {
            NotificationError::AuthenticationFailed(message)
        }
        Some(code) => NotificationError::Rejected { code, message },
        None => NotificationError::ConnectionFailed(message),
    }
}
