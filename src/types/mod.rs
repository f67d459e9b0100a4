//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - 設定エラー型: 環境変数の欠落・不正値
//! - ストアエラー型: コンテンツストア呼び出しの失敗

pub mod config;
pub mod error;

// 便利な再エクスポート
pub use config::{ConfigError, ConfigResult};
pub use error::{StoreError, StoreResult};
