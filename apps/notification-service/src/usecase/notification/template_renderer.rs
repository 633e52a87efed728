//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **HTML は自動エスケープ**: 表示名などの利用者入力は `.html` テンプレートでエスケープされる。
//!   URL は設定値または呼び出し元が組み立てたリンクなので `safe` で埋め込む
//! - **純粋関数**: 入力（表示名、コード / リンク）だけから本文が決まる

use fashionforward_domain::notification::{NotificationError, NotificationKind, OneTimePasscode};
use tera::{Context, Tera};

use crate::config::BRAND_NAME;

pub const PASSWORD_RESET_OTP_SUBJECT: &str = "Your Password Reset OTP - Fashion Forward";
pub const PASSWORD_RESET_LINK_SUBJECT: &str = "Reset Your Password - Fashion Forward";
pub const WELCOME_SUBJECT: &str = "Welcome to Fashion Forward!";

const OTP_EXPIRES_IN: &str = "5 minutes";
const RESET_LINK_EXPIRES_IN: &str = "1 hour";

/// レンダリング結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject:   String,
    pub html_body: String,
    pub text_body: String,
}

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、通知種別ごとの本文を生成する。
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "_layout.html",
                    include_str!("../../../templates/notifications/_layout.html"),
                ),
                (
                    "password_reset_otp.html",
                    include_str!("../../../templates/notifications/password_reset_otp.html"),
                ),
                (
                    "password_reset_otp.txt",
                    include_str!("../../../templates/notifications/password_reset_otp.txt"),
                ),
                (
                    "password_reset_link.html",
                    include_str!("../../../templates/notifications/password_reset_link.html"),
                ),
                (
                    "password_reset_link.txt",
                    include_str!("../../../templates/notifications/password_reset_link.txt"),
                ),
                (
                    "welcome.html",
                    include_str!("../../../templates/notifications/welcome.html"),
                ),
                (
                    "welcome.txt",
                    include_str!("../../../templates/notifications/welcome.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// パスワードリセット OTP メールを生成する
    pub fn render_password_reset_otp(
        &self,
        display_name: &str,
        code: &OneTimePasscode,
    ) -> Result<RenderedEmail, NotificationError> {
        let mut context = self.base_context(display_name);
        context.insert("code", code.as_str());
        context.insert("expires_in", OTP_EXPIRES_IN);

        self.render(
            NotificationKind::PasswordResetOtp,
            PASSWORD_RESET_OTP_SUBJECT,
            &context,
        )
    }

    /// パスワードリセットリンクメールを生成する
    pub fn render_password_reset_link(
        &self,
        display_name: &str,
        reset_url: &str,
    ) -> Result<RenderedEmail, NotificationError> {
        let mut context = self.base_context(display_name);
        context.insert("reset_url", reset_url);
        context.insert("expires_in", RESET_LINK_EXPIRES_IN);

        self.render(
            NotificationKind::PasswordResetLink,
            PASSWORD_RESET_LINK_SUBJECT,
            &context,
        )
    }

    /// ウェルカムメールを生成する
    ///
    /// # 引数
    ///
    /// - `frontend_url`: ストアフロントの URL（例: `http://localhost:5173`）
    pub fn render_welcome(
        &self,
        display_name: &str,
        frontend_url: &str,
    ) -> Result<RenderedEmail, NotificationError> {
        let mut context = self.base_context(display_name);
        context.insert("frontend_url", frontend_url);

        self.render(NotificationKind::Welcome, WELCOME_SUBJECT, &context)
    }

    fn base_context(&self, display_name: &str) -> Context {
        let mut context = Context::new();
        context.insert("brand", BRAND_NAME);
        context.insert("display_name", display_name);
        context
    }

    /// `{kind}.html` と `{kind}.txt` をレンダリングする
    fn render(
        &self,
        kind: NotificationKind,
        subject: &str,
        context: &Context,
    ) -> Result<RenderedEmail, NotificationError> {
        let html_body = self
            .engine
            .render(&format!("{kind}.html"), context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        let text_body = self
            .engine
            .render(&format!("{kind}.txt"), context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(RenderedEmail {
            subject: subject.to_string(),
            html_body,
            text_body,
        })
    }
}
