//! テストモード制御モジュール
//!
//! このモジュールは、テストの実行モード（モック/オンライン）を
//! 切り替えて同じテストコードでリポジトリを検証する機能を提供します。
//!
//! ## 使用方法
//!
//! ```text
//! cargo test                                   # モック（インメモリストア）
//! cargo test --features online                 # 実際のNewt（.envの設定を使用）
//! TEST_ONLINE=1 cargo test --test test_mode_controller
//! ```

use newt_blog_query::domain::article::ArticleRepository;
use newt_blog_query::domain::{page_count, AggregateRepository, ArticleFilters};
use newt_blog_query::infra::api::{ContentStoreClient, InMemoryContentStore, ReqwestContentStoreClient};
use newt_blog_query::infra::SiteConfig;
use serde_json::json;
use std::sync::Arc;

/// ストアのテスト制御モジュール
pub mod store {
    use super::*;

    /// オンラインテストモードかどうかを判定する
    ///
    /// 以下の条件でオンラインモードと判定される：
    /// 1. `online` featureが有効
    /// 2. `TEST_ONLINE` 環境変数が設定されている
    pub fn is_online_mode() -> bool {
        cfg!(feature = "online") || std::env::var("TEST_ONLINE").is_ok()
    }

    /// モック用の設定
    fn mock_config() -> SiteConfig {
        SiteConfig::from_lookup(|name| match name {
            "NEWT_SPACE_UID" => Some("space".to_string()),
            "NEWT_API_TOKEN" => Some("token".to_string()),
            "NEWT_APP_UID" => Some("blog".to_string()),
            "PAGE_LIMIT" => Some("3".to_string()),
            _ => None,
        })
        .expect("モック設定の作成に失敗")
    }

    /// モック用のストア（2021年と2023年に記事がある）
    fn mock_store() -> InMemoryContentStore {
        let store = InMemoryContentStore::new("blog");
        store.insert("tag", json!({ "_id": "t1", "slug": "rust", "name": "Rust" }));
        store.insert("author", json!({ "_id": "au1", "slug": "taro", "fullName": "Taro" }));
        for (i, created_at) in [
            "2021-02-01T09:00:00+09:00",
            "2023-03-01T09:00:00+09:00",
            "2023-04-01T09:00:00+09:00",
            "2023-05-01T09:00:00+09:00",
        ]
        .iter()
        .enumerate()
        {
            store.insert(
                "article",
                json!({
                    "_id": format!("a{}", i),
                    "_sys": { "createdAt": created_at },
                    "slug": format!("post-{}", i),
                    "title": format!("Post {}", i),
                    "body": "<p>Newt</p>",
                    "author": { "_id": "au1", "slug": "taro", "fullName": "Taro" },
                    "tags": [{ "_id": "t1", "slug": "rust", "name": "Rust" }]
                }),
            );
        }
        store
    }

    /// モードに応じた設定とリポジトリを作成する
    pub fn create_repositories() -> (SiteConfig, ArticleRepository, AggregateRepository) {
        let (config, client): (SiteConfig, Arc<dyn ContentStoreClient>) = if is_online_mode() {
            let _ = dotenvy::dotenv();
            let config = SiteConfig::from_env().expect("オンラインテストには.envの設定が必要");
            let client = ReqwestContentStoreClient::new(config.store.clone())
                .expect("クライアントの作成に失敗");
            (config, Arc::new(client))
        } else {
            (mock_config(), Arc::new(mock_store()))
        };
        let articles = ArticleRepository::new(client.clone(), &config);
        let aggregates = AggregateRepository::new(client, &config);
        (config, articles, aggregates)
    }
}

#[tokio::test]
async fn test_unified_list_respects_limit() {
    let (config, articles, _) = store::create_repositories();

    let first = articles
        .list_articles(&ArticleFilters::none(), None)
        .await
        .expect("記事一覧の取得に失敗");
    assert!(first.items.len() <= config.page_size as usize);
    assert!(first.total >= first.items.len() as u64);

    // 最後のページを超えた場合は空になる
    let beyond = page_count(first.total, config.page_size) + 1;
    let empty = articles
        .list_articles(
            &ArticleFilters::none(),
            Some(newt_blog_query::domain::Pagination {
                page: beyond,
                limit: config.page_size,
            }),
        )
        .await
        .expect("記事一覧の取得に失敗");
    assert!(empty.items.is_empty());
    assert_eq!(empty.total, first.total);

    if !store::is_online_mode() {
        assert_eq!(first.total, 4);
        assert_eq!(first.items.len(), 3);
    }
}

#[tokio::test]
async fn test_unified_archive_has_no_gaps() {
    let (_, _, aggregates) = store::create_repositories();

    let archive = aggregates.yearly_archive().await.expect("アーカイブの集計に失敗");
    for pair in archive.windows(2) {
        assert_eq!(pair[1].year, pair[0].year + 1, "年の抜けがあってはならない");
    }

    if !store::is_online_mode() {
        let counts: Vec<(i32, u64)> = archive.iter().map(|b| (b.year, b.count)).take(3).collect();
        assert_eq!(counts, vec![(2021, 1), (2022, 0), (2023, 3)]);
    }
}

#[tokio::test]
async fn test_unified_adjacent_boundaries() {
    let (_, articles, _) = store::create_repositories();
    let slugs = articles.list_article_slugs().await.expect("スラッグ一覧の取得に失敗");
    let (Some(newest), Some(oldest)) = (slugs.first(), slugs.last()) else {
        return;
    };

    let newest = articles
        .get_article_by_slug(newest)
        .await
        .expect("記事の取得に失敗")
        .expect("一覧にある記事は取得できるべき");
    let oldest = articles
        .get_article_by_slug(oldest)
        .await
        .expect("記事の取得に失敗")
        .expect("一覧にある記事は取得できるべき");

    use newt_blog_query::domain::Direction;
    assert!(articles
        .get_adjacent_article(Direction::Next, newest.created_at())
        .await
        .expect("次の記事の取得に失敗")
        .is_none());
    assert!(articles
        .get_adjacent_article(Direction::Previous, oldest.created_at())
        .await
        .expect("前の記事の取得に失敗")
        .is_none());
}

/// 重い統合テスト - 静的パスをすべて列挙する
#[cfg(feature = "online-slow")]
#[tokio::test]
async fn test_collect_all_static_paths_online() {
    let (config, articles, aggregates) = store::create_repositories();
    let paths = newt_blog_query::app::collect_static_paths(&articles, &aggregates, &config)
        .await
        .expect("静的パスの列挙に失敗");
    println!("✅ 静的パス {}件を列挙しました", paths.len());
    assert!(paths.contains("/") || paths.is_empty());
}
