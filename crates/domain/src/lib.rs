//! # Fashion Forward 通知ドメイン
//!
//! トランザクションメール（パスワードリセット OTP、リセットリンク、ウェルカムメール）の
//! ドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **純粋なデータ型のみ**: SMTP 接続やテンプレートエンジンには依存しない
//! - **送信結果は値で返す**: 送信失敗は [`notification::SendResult`] で表現し、
//!   呼び出し元へ例外的に伝播させない
//!
//! ## 依存関係の方向
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`notification`] - メッセージ、送信結果、エラー、トランスポート設定

pub mod notification;
