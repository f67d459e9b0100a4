//! インフラ層
//!
//! 設定の読み込みとコンテンツストアへのアクセスを担当します。

pub mod api;
pub mod config;

pub use config::{ClassificationAxis, ContentTypes, SiteConfig, StoreConfig};
