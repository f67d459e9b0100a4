//! ビルド時のワークフロー
//!
//! 静的生成のために、リポジトリを組み合わせてページ単位のデータとパスの一覧を作る。

pub mod navigation;
pub mod pages;
pub mod workflow;

pub use navigation::{build_navigation, rank_by_popularity, Navigation};
pub use pages::{load_article_view, load_list_page, search_articles, ArticleView, ListPage};
pub use workflow::{collect_static_paths, StaticPaths};
