//! # Notification Service ライブラリ
//!
//! Fashion Forward ストアフロントのトランザクションメール送信を公開する。
//! ストアフロントのバックエンドは [`usecase::NotificationSender`] を起動時に 1 つ作り、
//! リクエスト間で共有する。

pub mod config;
pub mod usecase;

pub use config::NotificationConfig;
pub use usecase::{NotificationSender, TemplateRenderer};
