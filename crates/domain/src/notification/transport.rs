//! トランスポート設定
//!
//! 起動時に一度だけ解決され、以降は不変。

use std::{fmt, time::Duration};

use strum::IntoStaticStr;

pub const SENDGRID_HOST: &str = "smtp.sendgrid.net";
pub const SENDGRID_PORT: u16 = 587;
/// SendGrid の SMTP ログイン ID（固定値、シークレットに API キーを渡す）
pub const SENDGRID_LOGIN: &str = "apikey";

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
/// 汎用プロファイルの接続・グリーティング・ソケットタイムアウト
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// プロバイダプロファイル
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
pub enum ProviderProfile {
    /// 任意の SMTP リレー（Gmail など）
    #[strum(serialize = "smtp")]
    Generic,
    /// SendGrid 互換リレー
    #[strum(serialize = "sendgrid")]
    SendGrid,
}

impl ProviderProfile {
    /// ホスト名からプロファイルを判定する
    ///
    /// ホスト名に `sendgrid` を含む場合のみ SendGrid とみなす（大文字小文字を区別する）。
    pub fn detect(host: Option<&str>) -> Self {
        match host {
            Some(host) if host.contains("sendgrid") => Self::SendGrid,
            _ => Self::Generic,
        }
    }
}

/// SMTP 認証情報
///
/// `Debug` ではシークレットを出力しない。
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    user:   String,
    secret: String,
}

impl SmtpCredentials {
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user:   user.into(),
            secret: secret.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("user", &self.user)
            .field("secret", &"***")
            .finish()
    }
}

/// 接続・グリーティング・ソケットの各タイムアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    pub connect:  Duration,
    pub greeting: Duration,
    pub socket:   Duration,
}

impl TransportTimeouts {
    /// 3 種類すべてに同じ値を設定する
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            connect:  timeout,
            greeting: timeout,
            socket:   timeout,
        }
    }

    /// 最も長いタイムアウト
    ///
    /// lettre はコマンド単位のタイムアウトを 1 つしか持たないため、これを渡す。
    pub fn longest(&self) -> Duration {
        self.connect.max(self.greeting).max(self.socket)
    }
}

/// 接続数の上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// 接続を再利用するか
    pub pooled:                      bool,
    /// 同時に張れる SMTP 接続数
    pub max_connections:             usize,
    /// 1 接続あたりの最大送信数
    pub max_messages_per_connection: usize,
}

impl ConnectionLimits {
    /// 汎用プロファイル: プールなし、同時 1 接続、1 接続 3 通まで
    pub const GENERIC: Self = Self {
        pooled:                      false,
        max_connections:             1,
        max_messages_per_connection: 3,
    };

    /// SendGrid プロファイル: プールなし、同時 5 接続、1 接続 100 通まで
    pub const SENDGRID: Self = Self {
        pooled:                      false,
        max_connections:             5,
        max_messages_per_connection: 100,
    };
}

/// トランスポート設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub profile:     ProviderProfile,
    pub host:        String,
    pub port:        u16,
    /// `true` なら接続直後から TLS（465 番ポート方式）、`false` なら STARTTLS で昇格する
    pub secure:      bool,
    pub credentials: SmtpCredentials,
    /// `None` の場合はトランスポートのデフォルトに任せる
    pub timeouts:    Option<TransportTimeouts>,
    pub limits:      ConnectionLimits,
}

impl TransportConfig {
    /// SendGrid プロファイル
    ///
    /// ホスト・ポート・ログイン ID は固定で、`api_key` のみを受け取る。
    pub fn sendgrid(api_key: impl Into<String>) -> Self {
        Self {
            profile:     ProviderProfile::SendGrid,
            host:        SENDGRID_HOST.to_string(),
            port:        SENDGRID_PORT,
            secure:      false,
            credentials: SmtpCredentials::new(SENDGRID_LOGIN, api_key),
            timeouts:    None,
            limits:      ConnectionLimits::SENDGRID,
        }
    }

    /// 汎用 SMTP プロファイル
    pub fn generic(
        host: impl Into<String>,
        port: u16,
        secure: bool,
        credentials: SmtpCredentials,
    ) -> Self {
        Self {
            profile: ProviderProfile::Generic,
            host: host.into(),
            port,
            secure,
            credentials,
            timeouts: Some(TransportTimeouts::uniform(DEFAULT_TIMEOUT)),
            limits: ConnectionLimits::GENERIC,
        }
    }
}
