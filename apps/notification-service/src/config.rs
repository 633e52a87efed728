//! # Notification Service 設定
//!
//! 環境変数から通知サービスの設定を読み込む。起動時に一度だけ解決し、以降は不変。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `SMTP_HOST` | No | リレーホスト（デフォルト: `smtp.gmail.com`）。`sendgrid` を含むと SendGrid プロファイル |
//! | `SMTP_PORT` | No | リレーポート（デフォルト: `587`、汎用プロファイルのみ） |
//! | `SMTP_USER` | No | ログイン ID、送信元アドレスのデフォルト |
//! | `SMTP_PASS` | No | パスワード / API キー |
//! | `SMTP_SECURE` | No | `true` で接続直後から TLS（汎用プロファイルのみ） |
//! | `FRONTEND_URL` | No | ウェルカムメールのリンク先（デフォルト: `http://localhost:5173`） |
//!
//! `SMTP_USER` / `SMTP_PASS` のどちらかが未設定、またはプレースホルダ値の場合は
//! 送信を無効化したフォールバックモードになる（エラーにはしない）。

use std::env;

use fashionforward_domain::notification::{
    DEFAULT_SMTP_HOST,
    DEFAULT_SMTP_PORT,
    ProviderProfile,
    SenderIdentity,
    SmtpCredentials,
    TransportConfig,
};

/// 送信元の表示名
pub const BRAND_NAME: &str = "Fashion Forward";
/// `SMTP_USER` 未設定時の送信元アドレス
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@fashionforward.com";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// `.env.example` に書かれているプレースホルダ
const PLACEHOLDER_USER: &str = "your-email@gmail.com";
const PLACEHOLDER_SECRET: &str = "your-app-password";

/// 送信が無効化されている理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisabledReason {
    /// `SMTP_USER` / `SMTP_PASS` の一方または両方が未設定
    MissingCredentials,
    /// プレースホルダ値のまま
    PlaceholderCredentials,
    /// 設定はあるがトランスポートを構築できなかった
    TransportUnavailable(String),
}

impl DisabledReason {
    /// 運用者向けのヒント
    pub fn hint(&self) -> String {
        match self {
            Self::MissingCredentials => {
                "SMTP_USER と SMTP_PASS の両方を設定してください".to_string()
            }
            Self::PlaceholderCredentials => {
                "プレースホルダ値のままです。実際の認証情報に置き換えてください".to_string()
            }
            Self::TransportUnavailable(cause) => {
                format!("トランスポートを構築できませんでした: {cause}")
            }
        }
    }
}

/// トランスポートの設定状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSetting {
    Disabled(DisabledReason),
    Configured(TransportConfig),
}

/// 通知サービスの設定
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// 送信トランスポート
    pub transport:    TransportSetting,
    /// 送信元（表示名 + アドレス）
    pub sender:       SenderIdentity,
    /// フロントエンド URL（メール内リンク用）
    pub frontend_url: String,
}

impl NotificationConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を読み込む
    ///
    /// 空文字列は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let user = get("SMTP_USER");
        let secret = get("SMTP_PASS");

        let transport = match (user.as_deref(), secret.as_deref()) {
            (Some(user), Some(secret)) if user == PLACEHOLDER_USER || secret == PLACEHOLDER_SECRET => {
                TransportSetting::Disabled(DisabledReason::PlaceholderCredentials)
            }
            (Some(user), Some(secret)) => {
                let host = get("SMTP_HOST");
                match ProviderProfile::detect(host.as_deref()) {
                    ProviderProfile::SendGrid => {
                        TransportSetting::Configured(TransportConfig::sendgrid(secret))
                    }
                    ProviderProfile::Generic => TransportSetting::Configured(TransportConfig::generic(
                        host.unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                        parse_port(get("SMTP_PORT").as_deref()),
                        parse_flag(get("SMTP_SECURE").as_deref()),
                        SmtpCredentials::new(user, secret),
                    )),
                }
            }
            _ => TransportSetting::Disabled(DisabledReason::MissingCredentials),
        };

        Self {
            transport,
            sender: SenderIdentity::new(
                BRAND_NAME,
                user.unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            ),
            frontend_url: get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        }
    }

    /// 解決済みの設定をログに出力する
    ///
    /// ユーザー名は先頭 3 文字のみ、シークレットは出力しない。
    pub fn log_summary(&self) {
        match &self.transport {
            TransportSetting::Configured(config) => {
                tracing::info!(
                    provider = %config.profile,
                    host = %config.host,
                    port = config.port,
                    secure = config.secure,
                    user = %mask(config.credentials.user()),
                    max_connections = config.limits.max_connections,
                    max_messages_per_connection = config.limits.max_messages_per_connection,
                    "メール送信を設定しました（接続確認は初回送信時または verify で行います）"
                );
            }
            TransportSetting::Disabled(reason) => {
                tracing::warn!(
                    reason = ?reason,
                    hint = %reason.hint(),
                    "メール送信は未設定です。フォールバックモード（ログ出力）で動作します"
                );
            }
        }
        tracing::debug!(
            sender = %self.sender,
            frontend_url = %self.frontend_url,
            "通知設定"
        );
    }
}

/// ポート番号を解釈する
///
/// 未設定・不正値・0 はデフォルトの 587 にフォールバックする。
fn parse_port(value: Option<&str>) -> u16 {
    let Some(value) = value else {
        return DEFAULT_SMTP_PORT;
    };
    match value.trim().parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => {
            tracing::warn!(
                value,
                default = DEFAULT_SMTP_PORT,
                "SMTP_PORT が不正なためデフォルトを使用します"
            );
            DEFAULT_SMTP_PORT
        }
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes")
    )
}

/// 先頭 3 文字 + `***`
fn mask(value: &str) -> String {
    let head: String = value.chars().take(3).collect();
    format!("{head}***")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use fashionforward_domain::notification::{ConnectionLimits, TransportTimeouts};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> NotificationConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        NotificationConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[rstest]
    #[case(&[])]
    #[case(&[("SMTP_USER", "shop@gmail.com")])]
    #[case(&[("SMTP_PASS", "app-pass")])]
    #[case(&[("SMTP_USER", ""), ("SMTP_PASS", "app-pass")])]
    fn 認証情報が欠けていると無効化される(#[case] pairs: &[(&str, &str)]) {
        let config = config_from(pairs);

        assert_eq!(
            config.transport,
            TransportSetting::Disabled(DisabledReason::MissingCredentials)
        );
    }

    #[rstest]
    #[case("your-email@gmail.com", "real-pass")]
    #[case("shop@gmail.com", "your-app-password")]
    fn プレースホルダ値は未設定として扱う(#[case] user: &str, #[case] secret: &str) {
        let config = config_from(&[("SMTP_USER", user), ("SMTP_PASS", secret)]);

        assert_eq!(
            config.transport,
            TransportSetting::Disabled(DisabledReason::PlaceholderCredentials)
        );
    }

    #[test]
    fn sendgridホストは固定のプロファイルになる() {
        let config = config_from(&[
            ("SMTP_HOST", "smtp.sendgrid.net"),
            ("SMTP_PORT", "2525"),
            ("SMTP_USER", "shop@fashionforward.com"),
            ("SMTP_PASS", "SG.secret"),
        ]);

        let TransportSetting::Configured(transport) = config.transport else {
            panic!("Configured であること");
        };
        assert_eq!(transport.profile, ProviderProfile::SendGrid);
        assert_eq!(transport.host, "smtp.sendgrid.net");
        assert_eq!(transport.port, 587);
        assert_eq!(transport.credentials.user(), "apikey");
        assert_eq!(transport.credentials.secret(), "SG.secret");
    }

    #[test]
    fn sendgridを含む任意のホストでもsendgridの固定ホストを使う() {
        let config = config_from(&[
            ("SMTP_HOST", "eu.sendgrid.example.com"),
            ("SMTP_USER", "shop@fashionforward.com"),
            ("SMTP_PASS", "SG.secret"),
        ]);

        let TransportSetting::Configured(transport) = config.transport else {
            panic!("Configured であること");
        };
        assert_eq!(transport.host, "smtp.sendgrid.net");
    }

    #[test]
    fn 汎用プロファイルはデフォルト値を使う() {
        let config = config_from(&[("SMTP_USER", "shop@gmail.com"), ("SMTP_PASS", "app-pass")]);

        let TransportSetting::Configured(transport) = config.transport else {
            panic!("Configured であること");
        };
        assert_eq!(transport.profile, ProviderProfile::Generic);
        assert_eq!(transport.host, "smtp.gmail.com");
        assert_eq!(transport.port, 587);
        assert!(!transport.secure);
        assert_eq!(transport.credentials.user(), "shop@gmail.com");
        assert_eq!(
            transport.timeouts,
            Some(TransportTimeouts::uniform(std::time::Duration::from_secs(15)))
        );
        assert_eq!(transport.limits, ConnectionLimits::GENERIC);
    }

    #[test]
    fn 汎用プロファイルはホストとポートを設定から読む() {
        let config = config_from(&[
            ("SMTP_HOST", "mail.example.com"),
            ("SMTP_PORT", "465"),
            ("SMTP_SECURE", "true"),
            ("SMTP_USER", "shop@example.com"),
            ("SMTP_PASS", "app-pass"),
        ]);

        let TransportSetting::Configured(transport) = config.transport else {
            panic!("Configured であること");
        };
        assert_eq!(transport.host, "mail.example.com");
        assert_eq!(transport.port, 465);
        assert!(transport.secure);
    }

    #[rstest]
    #[case(None, 587)]
    #[case(Some("2525"), 2525)]
    #[case(Some(" 25 "), 25)]
    #[case(Some("abc"), 587)]
    #[case(Some("0"), 587)]
    #[case(Some("70000"), 587)]
    fn parse_portは不正値をデフォルトにフォールバックする(
        #[case] value: Option<&str>,
        #[case] expected: u16,
    ) {
        assert_eq!(parse_port(value), expected);
    }

    #[test]
    fn 送信元はsmtp_userを使い未設定ならデフォルト() {
        let configured =
            config_from(&[("SMTP_USER", "shop@gmail.com"), ("SMTP_PASS", "app-pass")]);
        let disabled = config_from(&[]);

        assert_eq!(
            configured.sender,
            SenderIdentity::new("Fashion Forward", "shop@gmail.com")
        );
        assert_eq!(
            disabled.sender,
            SenderIdentity::new("Fashion Forward", "noreply@fashionforward.com")
        );
    }

    #[test]
    fn frontend_urlのデフォルトと上書き() {
        assert_eq!(config_from(&[]).frontend_url, "http://localhost:5173");
        assert_eq!(
            config_from(&[("FRONTEND_URL", "https://shop.example.com")]).frontend_url,
            "https://shop.example.com"
        );
    }

    #[test]
    fn maskは先頭3文字だけを残す() {
        assert_eq!(mask("shop@gmail.com"), "sho***");
        assert_eq!(mask("ab"), "ab***");
    }
}
