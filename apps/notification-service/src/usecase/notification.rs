//! # 通知ユースケース
//!
//! トランザクションメールの生成・送信を統合する。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによるメール生成
//! - [`service`] - テンプレートレンダリング + 制限時間付き送信の統合サービス

pub mod service;
pub mod template_renderer;

pub use service::{NotificationSender, Transport};
pub use template_renderer::{RenderedEmail, TemplateRenderer};
