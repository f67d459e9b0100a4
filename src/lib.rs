//! Newtに置かれたブログ記事の問い合わせと集計
//!
//! 静的生成に必要な記事一覧・記事詳細・前後記事・タグ/著者/年別の件数と、
//! 生成すべきページの一覧を提供します。

pub mod app;
pub mod domain;
pub mod infra;
pub mod types;
