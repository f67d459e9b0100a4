use super::model::Article;
use crate::domain::query::{ArticleFilters, Direction, Pagination, QueryBuilder};
use crate::infra::api::{ContentStoreClient, StoreQuery};
use crate::infra::SiteConfig;
use crate::types::{StoreError, StoreResult};
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// スラッグ一覧取得時の1リクエストあたりの件数
const SLUG_PAGE_SIZE: u64 = 100;

/// 記事一覧の1ページ分
#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePage {
    pub items: Vec<Article>,
    /// 絞り込み後の全件数（このページの件数ではない）
    pub total: u64,
}

/// 記事の読み出しを担当するリポジトリ
///
/// 一覧・詳細・前後記事のすべてが同じクエリビルダーを通るため、
/// 検索や絞り込みの意味はどの画面でも一致する。
#[derive(Clone)]
pub struct ArticleRepository {
    client: Arc<dyn ContentStoreClient>,
    builder: QueryBuilder,
    model_uid: String,
}

impl ArticleRepository {
    pub fn new(client: Arc<dyn ContentStoreClient>, config: &SiteConfig) -> Self {
        Self::with_builder(
            client,
            QueryBuilder::from_config(config),
            &config.content_types.article,
        )
    }

    pub fn with_builder(
        client: Arc<dyn ContentStoreClient>,
        builder: QueryBuilder,
        model_uid: &str,
    ) -> Self {
        Self {
            client,
            builder,
            model_uid: model_uid.to_string(),
        }
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// 条件に合う記事の1ページ分と全件数を取得する
    pub async fn list_articles(
        &self,
        filters: &ArticleFilters,
        pagination: Option<Pagination>,
    ) -> StoreResult<ArticlePage> {
        let query = self.builder.build_article_query(filters, pagination);
        let limit = query.limit as usize;
        let (mut items, total) = self.fetch::<Article>(&query).await?;
        items.truncate(limit);
        Ok(ArticlePage { items, total })
    }

    /// 条件に合う記事の件数のみを取得する
    pub async fn count_articles(&self, filters: &ArticleFilters) -> StoreResult<u64> {
        let query = self.builder.build_count_query(filters);
        let response = self.client.list_by_type(&self.model_uid, &query).await?;
        Ok(response.total)
    }

    /// スラッグから記事を取得する
    ///
    /// 空のスラッグや一致なしは`None`を返す。
    pub async fn get_article_by_slug(&self, slug: &str) -> StoreResult<Option<Article>> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(None);
        }
        let query = self.builder.build_slug_query(slug);
        let (items, _) = self.fetch::<Article>(&query).await?;
        Ok(items.into_iter().next())
    }

    /// 基準日時の直前（Previous）または直後（Next）の記事を取得する
    ///
    /// 時系列の端では`None`を返す。
    pub async fn get_adjacent_article(
        &self,
        direction: Direction,
        reference: DateTime<FixedOffset>,
    ) -> StoreResult<Option<Article>> {
        let query = self.builder.build_adjacent_query(direction, reference);
        let (items, _) = self.fetch::<Article>(&query).await?;
        Ok(items.into_iter().next())
    }

    /// 最も古い記事の作成日時
    pub async fn oldest_created_at(&self) -> StoreResult<Option<DateTime<FixedOffset>>> {
        #[derive(serde::Deserialize)]
        struct SysOnly {
            #[serde(rename = "_sys")]
            sys: super::model::SysMeta,
        }

        let query = self.builder.build_oldest_query();
        let (items, _) = self.fetch::<SysOnly>(&query).await?;
        Ok(items.into_iter().next().map(|item| item.sys.created_at))
    }

    /// 全記事のスラッグを新しい順に取得する
    pub async fn list_article_slugs(&self) -> StoreResult<Vec<String>> {
        #[derive(serde::Deserialize)]
        struct SlugOnly {
            slug: String,
        }

        let mut slugs = Vec::new();
        let mut skip = 0;
        loop {
            let query = self.builder.build_slug_list_query(skip, SLUG_PAGE_SIZE);
            let (items, total) = self.fetch::<SlugOnly>(&query).await?;
            let fetched = items.len() as u64;
            slugs.extend(items.into_iter().map(|item| item.slug));
            skip += fetched;
            if fetched == 0 || skip >= total {
                break;
            }
        }
        Ok(slugs)
    }

    async fn fetch<T: DeserializeOwned>(&self, query: &StoreQuery) -> StoreResult<(Vec<T>, u64)> {
        let response = self.client.list_by_type(&self.model_uid, query).await?;
        let items = decode_items(&self.model_uid, response.items)?;
        Ok((items, response.total))
    }
}

/// 生のJSONを型付きのレコードに変換する
pub(crate) fn decode_items<T: DeserializeOwned>(model: &str, items: Vec<Value>) -> StoreResult<Vec<T>> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|e| StoreError::decode(format!("{}のレコード", model), e))
        })
        .collect()
}
