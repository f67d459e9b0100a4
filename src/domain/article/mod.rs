pub mod model;
pub mod repository;

// 公開APIの再エクスポート

// model.rsから
pub use model::{
    Article, Author, Category, HasId, Reference, SeoMeta, SysMeta, Tag, Term, NO_AUTHOR_NAME,
};

// repository.rsから
pub use repository::{ArticlePage, ArticleRepository};
