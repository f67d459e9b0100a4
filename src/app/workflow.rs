use crate::domain::{
    enumerate_pages, enumerate_partitioned_pages, AggregateRepository, ArticleFilters,
    PageDescriptor, PartitionKey, TermKey,
};
use crate::domain::article::ArticleRepository;
use crate::infra::{ClassificationAxis, SiteConfig};
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};

/// 静的生成するパスの集合（挿入順を保ち、重複を除く）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticPaths {
    paths: Vec<String>,
    seen: HashSet<String>,
}

impl StaticPaths {
    pub fn push(&mut self, path: String) {
        if self.seen.insert(path.clone()) {
            self.paths.push(path);
        }
    }

    /// 一覧ページを追加する（1ページ目はページ番号なしのパスも追加）
    pub fn push_pages(&mut self, pages: &[PageDescriptor]) {
        for page in pages {
            if let Some(index) = page.index_path() {
                self.push(index);
            }
            self.push(page.path());
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }
}

/// 静的生成が必要なすべてのパスを列挙する（依存性を注入）
///
/// 1. トップの一覧ページ
/// 2. 分類軸（タグまたはカテゴリ）ごとの一覧ページ
/// 3. 著者ごとの一覧ページ
/// 4. 年別アーカイブの一覧ページ
/// 5. 記事ページ
///
/// ストアの呼び出しに失敗した時点でビルド全体を失敗させる。
pub async fn collect_static_paths(
    articles: &ArticleRepository,
    aggregates: &AggregateRepository,
    config: &SiteConfig,
) -> Result<StaticPaths> {
    tracing::info!("=== 静的パスの列挙を開始 ===");
    let limit = config.page_size;
    let mut paths = StaticPaths::default();

    // 段階1: トップ
    let total = articles
        .count_articles(&ArticleFilters::none())
        .await
        .context("記事総数の取得に失敗")?;
    paths.push_pages(&enumerate_pages(total, limit, None));
    tracing::info!(total, "トップ一覧");

    // 段階2: 分類軸
    let terms = match config.classification {
        ClassificationAxis::Tags => aggregates
            .tag_counts()
            .await
            .context("タグ集計に失敗")?
            .into_iter()
            .map(|c| (PartitionKey::Tag(TermKey::new(&c.item.id, &c.item.slug)), c.count))
            .collect::<Vec<_>>(),
        ClassificationAxis::Categories => aggregates
            .category_counts()
            .await
            .context("カテゴリ集計に失敗")?
            .into_iter()
            .map(|c| {
                (
                    PartitionKey::Category(TermKey::new(&c.item.id, &c.item.slug)),
                    c.count,
                )
            })
            .collect::<Vec<_>>(),
    };
    push_partitioned(&mut paths, terms, limit);

    // 段階3: 著者
    let authors = aggregates
        .author_counts()
        .await
        .context("著者集計に失敗")?
        .into_iter()
        .map(|c| (PartitionKey::Author(TermKey::new(&c.item.id, &c.item.slug)), c.count))
        .collect::<Vec<_>>();
    push_partitioned(&mut paths, authors, limit);

    // 段階4: 年別アーカイブ
    let archives = aggregates
        .yearly_archive()
        .await
        .context("年別アーカイブの集計に失敗")?
        .into_iter()
        .map(|bucket| (PartitionKey::Year(bucket.year), bucket.count))
        .collect::<Vec<_>>();
    push_partitioned(&mut paths, archives, limit);

    // 段階5: 記事
    let slugs = articles
        .list_article_slugs()
        .await
        .context("記事スラッグ一覧の取得に失敗")?;
    for slug in slugs {
        paths.push(format!("/article/{}", slug));
    }

    tracing::info!(paths = paths.len(), "=== 静的パスの列挙が完了 ===");
    Ok(paths)
}

fn push_partitioned(paths: &mut StaticPaths, counts: Vec<(PartitionKey, u64)>, limit: u32) {
    let partitions: Vec<PartitionKey> = counts.iter().map(|(key, _)| key.clone()).collect();
    let lookup: HashMap<PartitionKey, u64> = counts.into_iter().collect();
    let pages = enumerate_partitioned_pages(
        &partitions,
        |key| lookup.get(key).copied().unwrap_or(0),
        limit,
    );
    paths.push_pages(&pages);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::repository::tests::article;
    use crate::domain::QueryBuilder;
    use crate::infra::api::InMemoryContentStore;
    use crate::infra::config::tests::test_config;
    use crate::infra::ContentTypes;
    use chrono::{Datelike, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn setup(config: &SiteConfig) -> (Arc<InMemoryContentStore>, ArticleRepository, AggregateRepository) {
        let store = InMemoryContentStore::new("blog");
        store.insert("tag", json!({ "_id": "t-rust", "slug": "rust", "name": "Rust" }));
        store.insert("tag", json!({ "_id": "t-unused", "slug": "unused", "name": "Unused" }));
        store.insert("category", json!({ "_id": "c-tech", "slug": "tech", "name": "Tech" }));
        store.insert("author", json!({ "_id": "taro", "slug": "taro", "fullName": "Taro" }));
        for i in 0..12 {
            let tags: &[&str] = if i % 2 == 0 { &["t-rust"] } else { &[] };
            store.insert(
                "article",
                article(&format!("a{:02}", i), &format!("2022-0{}-01T00:00:00+09:00", (i % 9) + 1), "Post", tags, Some("taro")),
            );
        }
        let store = Arc::new(store);
        let articles = ArticleRepository::with_builder(
            store.clone(),
            QueryBuilder::from_config(config),
            &ContentTypes::default().article,
        );
        let aggregates = AggregateRepository::new(store.clone(), config);
        (store, articles, aggregates)
    }

    #[tokio::test]
    async fn test_collect_static_paths() -> Result<(), anyhow::Error> {
        let config = test_config();
        let (_store, articles, aggregates) = setup(&config);

        let paths = collect_static_paths(&articles, &aggregates, &config).await?;

        for expected in [
            "/",
            "/page/1",
            "/page/2",
            "/tag/rust",
            "/tag/rust/page/1",
            "/author/taro",
            "/author/taro/page/2",
            "/archive/2022",
            "/archive/2022/page/2",
            "/article/slug-a00",
            "/article/slug-a11",
        ] {
            assert!(paths.contains(expected), "{}が含まれていない", expected);
        }
        assert!(!paths.contains("/page/3"));
        assert!(!paths.contains("/tag/rust/page/2"), "6件は1ページに収まる");
        assert!(!paths.contains("/tag/unused"), "0件のタグからはパスを生成しない");
        assert!(!paths.contains("/category/tech"), "タグ運用ではカテゴリのパスを生成しない");

        let current_year = Utc::now().with_timezone(&config.timezone).year();
        if current_year > 2022 {
            assert!(!paths.contains("/archive/2023"), "0件の年からはパスを生成しない");
        }
        let article_paths = paths.paths().iter().filter(|p| p.starts_with("/article/")).count();
        assert_eq!(article_paths, 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_fails_the_build() {
        let config = test_config();
        let (store, articles, aggregates) = setup(&config);
        store.set_failure(Some(503));
        let result = collect_static_paths(&articles, &aggregates, &config).await;
        assert!(result.is_err(), "ストア障害は空のビルドではなく失敗になるべき");
    }

    #[test]
    fn test_static_paths_dedup() {
        let mut paths = StaticPaths::default();
        paths.push("/".to_string());
        paths.push("/".to_string());
        paths.push("/page/1".to_string());
        assert_eq!(paths.paths(), &["/".to_string(), "/page/1".to_string()]);
    }
}
