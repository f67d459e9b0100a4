//! ドメイン層
//!
//! - query: 画面の意図からストアクエリへの変換
//! - article: 記事モデルと記事リポジトリ
//! - aggregate: タグ・著者・年別の集計
//! - pagination: 静的生成するページの列挙

pub mod aggregate;
pub mod article;
pub mod pagination;
pub mod query;

pub use aggregate::{AggregateRepository, ArchiveBucket, Counted};
pub use pagination::{
    enumerate_pages, enumerate_partitioned_pages, page_count, PageDescriptor, PartitionKey,
    TermKey,
};
pub use query::{ArticleFilters, Direction, Pagination, PartitionFilter, QueryBuilder};
