//! # Fashion Forward インフラ層
//!
//! メール送信プロトコル（SMTP）との通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **トランスポート抽象**: [`notification::MailTransport`] trait
//! - **SMTP 実装**: lettre による [`notification::SmtpMailTransport`]
//! - **テスト用モック**: `test-utils` feature で [`mock`] を公開
//!
//! ## 依存関係
//!
//! ```text
//! notification-service → infra → domain
//! ```

pub mod notification;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
