//! # ユースケース層
//!
//! - [`notification`] - テンプレートレンダリング + 送信の統合

pub mod notification;

pub use notification::{NotificationSender, TemplateRenderer, Transport};
