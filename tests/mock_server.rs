//! Newt API モックサーバー
//!
//! このモジュールはhttpmockを使用してNewtのコンテンツAPIをモックし、
//! 外部通信を完全に遮断した状態でHTTPクライアントとリポジトリを検証します。

use httpmock::prelude::*;
use newt_blog_query::domain::article::ArticleRepository;
use newt_blog_query::domain::{ArticleFilters, Pagination, PartitionFilter};
use newt_blog_query::infra::api::{ContentStoreClient, ReqwestContentStoreClient};
use newt_blog_query::infra::SiteConfig;
use serde_json::{json, Value};
use std::sync::Arc;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

const TOKEN: &str = "test-token";

/// NewtのコンテンツAPIのモックサーバー
pub struct NewtMockServer {
    server: MockServer,
}

impl NewtMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    /// モックサーバーに接続する設定
    pub fn config(&self) -> SiteConfig {
        let base_url = self.server.base_url();
        SiteConfig::from_lookup(|name| match name {
            "NEWT_SPACE_UID" => Some("space".to_string()),
            "NEWT_API_TOKEN" => Some(TOKEN.to_string()),
            "NEWT_APP_UID" => Some("blog".to_string()),
            "NEWT_BASE_URL" => Some(base_url.clone()),
            _ => None,
        })
        .expect("テスト用設定の作成に失敗")
    }

    pub fn client(&self) -> Arc<dyn ContentStoreClient> {
        let config = self.config();
        Arc::new(ReqwestContentStoreClient::new(config.store).expect("クライアントの作成に失敗"))
    }

    pub fn repository(&self) -> ArticleRepository {
        ArticleRepository::new(self.client(), &self.config())
    }

    /// 記事一覧の成功レスポンスをモック（指定したクエリパラメータに一致する場合のみ）
    pub async fn mock_articles(&self, params: &[(&str, &str)], items: Vec<Value>, total: u64) -> httpmock::Mock<'_> {
        let params: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.server
            .mock_async(|when, then| {
                let mut when = when
                    .method(GET)
                    .path("/v1/blog/article")
                    .header("authorization", format!("Bearer {}", TOKEN));
                for (key, value) in &params {
                    when = when.query_param(key, value);
                }
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "skip": 0,
                        "limit": items.len(),
                        "total": total,
                        "items": items
                    }));
            })
            .await
    }

    /// 記事一覧のエラーレスポンスをモック
    pub async fn mock_articles_error(&self, status: u16) -> httpmock::Mock<'_> {
        self.server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/blog/article");
                then.status(status)
                    .header("content-type", "application/json")
                    .json_body(json!({ "error": "Service Unavailable" }));
            })
            .await
    }
}

fn article(id: &str, created_at: &str) -> Value {
    json!({
        "_id": id,
        "_sys": { "createdAt": created_at, "updatedAt": created_at },
        "slug": format!("slug-{}", id),
        "title": format!("Title {}", id),
        "body": "<p>body</p>",
        "coverImage": { "src": "https://img/cover.png" },
        "meta": null,
        "author": { "_id": "taro", "slug": "taro", "fullName": "Taro", "profileImage": null, "biography": "" },
        "tags": [{ "_id": "t1", "slug": "rust", "name": "Rust" }],
        "categories": []
    })
}

#[tokio::test]
async fn test_list_articles_sends_tag_and_paging_params() {
    let server = NewtMockServer::start().await;
    let mock = server
        .mock_articles(
            &[
                ("tags", "t1"),
                ("skip", "10"),
                ("limit", "10"),
                ("depth", "1"),
                ("order", "-_sys.createdAt,-_id"),
            ],
            vec![article("a11", "2023-06-15T00:00:00+09:00")],
            11,
        )
        .await;

    let repo = server.repository();
    let page = repo
        .list_articles(
            &ArticleFilters::partition(PartitionFilter::Tag("t1".to_string())),
            Some(Pagination { page: 2, limit: 10 }),
        )
        .await
        .expect("記事一覧の取得に失敗");

    mock.assert_async().await;
    assert_eq!(page.total, 11);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].author_name(), "Taro");
    assert_eq!(page.items[0].resolved_tags().next().map(|t| t.slug.as_str()), Some("rust"));
}

#[tokio::test]
async fn test_search_sends_or_group_and_year_range() {
    let server = NewtMockServer::start().await;
    let mock = server
        .mock_articles(
            &[
                ("or", r#"[{"title":{"match":"newt"}},{"body":{"match":"newt"}}]"#),
                ("_sys.createdAt[gte]", "2023-01-01T00:00:00+09:00"),
                ("_sys.createdAt[lt]", "2024-01-01T00:00:00+09:00"),
            ],
            vec![],
            0,
        )
        .await;

    let repo = server.repository();
    let filters = ArticleFilters::search("newt").with_partition(PartitionFilter::Year(2023));
    let page = repo.list_articles(&filters, None).await.expect("検索に失敗");

    mock.assert_async().await;
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_get_article_by_slug_uses_detail_depth() {
    let server = NewtMockServer::start().await;
    let found = server
        .mock_articles(
            &[("slug", "slug-a1"), ("depth", "2"), ("limit", "1")],
            vec![article("a1", "2023-06-15T00:00:00+09:00")],
            1,
        )
        .await;

    let repo = server.repository();
    let article = repo
        .get_article_by_slug("slug-a1")
        .await
        .expect("記事の取得に失敗");

    found.assert_async().await;
    assert_eq!(article.map(|a| a.id), Some("a1".to_string()));
}

#[tokio::test]
async fn test_server_error_is_store_unavailable() {
    let server = NewtMockServer::start().await;
    server.mock_articles_error(503).await;

    let repo = server.repository();
    let err = repo
        .list_articles(&ArticleFilters::none(), None)
        .await
        .expect_err("5xxはエラーになるべき");
    assert!(err.is_unavailable(), "5xxはストア利用不可として扱う: {}", err);
}

#[tokio::test]
async fn test_get_app() {
    let server = NewtMockServer::start().await;
    let mock = server
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/space/apps/blog")
                .header("authorization", format!("Bearer {}", TOKEN));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "uid": "blog", "name": "Newt Blog", "cover": null }));
        })
        .await;

    let app = server.client().get_app().await.expect("アプリ情報の取得に失敗");
    mock.assert_async().await;
    assert_eq!(app.display_name(), "Newt Blog");
}
