//! ナビゲーション用の集計
//!
//! タグ・著者・カテゴリごとの記事数と、年別アーカイブの記事数を求める。
//! キーごとの件数取得は`max_concurrency`件までしか同時に発行しない。
//! 人気順などの並べ替えは呼び出し側（app::navigation）の責務。

use crate::domain::article::repository::decode_items;
use crate::domain::article::{ArticleRepository, Author, Category, Tag};
use crate::domain::query::{ArticleFilters, PartitionFilter};
use crate::infra::api::{ContentStoreClient, StoreQuery};
use crate::infra::{ContentTypes, SiteConfig};
use crate::types::{StoreError, StoreResult};
use chrono::{Datelike, FixedOffset, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// 参照データ一覧取得時の1リクエストあたりの件数
const ENTITY_PAGE_SIZE: u64 = 100;

/// 件数付きの項目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Counted<T> {
    pub item: T,
    pub count: u64,
}

/// 年別アーカイブの1区間
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArchiveBucket {
    pub year: i32,
    pub count: u64,
}

/// 集計を担当するリポジトリ
#[derive(Clone)]
pub struct AggregateRepository {
    client: Arc<dyn ContentStoreClient>,
    articles: ArticleRepository,
    content_types: ContentTypes,
    timezone: FixedOffset,
    max_concurrency: usize,
}

impl AggregateRepository {
    pub fn new(client: Arc<dyn ContentStoreClient>, config: &SiteConfig) -> Self {
        let articles = ArticleRepository::new(client.clone(), config);
        Self::with_parts(
            client,
            articles,
            config.content_types.clone(),
            config.timezone,
            config.max_concurrency,
        )
    }

    pub fn with_parts(
        client: Arc<dyn ContentStoreClient>,
        articles: ArticleRepository,
        content_types: ContentTypes,
        timezone: FixedOffset,
        max_concurrency: usize,
    ) -> Self {
        Self {
            client,
            articles,
            content_types,
            timezone,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// 全タグを取得する
    pub async fn fetch_tags(&self) -> StoreResult<Vec<Tag>> {
        self.fetch_all(&self.content_types.tag).await
    }

    /// 全著者を取得する
    pub async fn fetch_authors(&self) -> StoreResult<Vec<Author>> {
        self.fetch_all(&self.content_types.author).await
    }

    /// 全カテゴリを取得する
    pub async fn fetch_categories(&self) -> StoreResult<Vec<Category>> {
        self.fetch_all(&self.content_types.category).await
    }

    /// タグごとの記事数（ストアの並び順のまま）
    pub async fn tag_counts(&self) -> StoreResult<Vec<Counted<Tag>>> {
        let tags = self.fetch_tags().await?;
        self.count_each(tags, |tag| PartitionFilter::Tag(tag.id.clone()))
            .await
    }

    /// 著者ごとの記事数（ストアの並び順のまま）
    pub async fn author_counts(&self) -> StoreResult<Vec<Counted<Author>>> {
        let authors = self.fetch_authors().await?;
        self.count_each(authors, |author| PartitionFilter::Author(author.id.clone()))
            .await
    }

    /// カテゴリごとの記事数（ストアの並び順のまま）
    pub async fn category_counts(&self) -> StoreResult<Vec<Counted<Category>>> {
        let categories = self.fetch_categories().await?;
        self.count_each(categories, |category| {
            PartitionFilter::Category(category.id.clone())
        })
        .await
    }

    /// 最古の記事の年から今年までの年別記事数
    pub async fn yearly_archive(&self) -> StoreResult<Vec<ArchiveBucket>> {
        let current_year = Utc::now().with_timezone(&self.timezone).year();
        self.yearly_archive_until(current_year).await
    }

    /// 最古の記事の年から`current_year`までの年別記事数
    ///
    /// 記事がなければ空を返す。記事のない年も0件として含める。
    pub async fn yearly_archive_until(&self, current_year: i32) -> StoreResult<Vec<ArchiveBucket>> {
        let Some(oldest) = self.articles.oldest_created_at().await? else {
            return Ok(Vec::new());
        };
        let first_year = oldest.with_timezone(&self.timezone).year();
        let years: Vec<i32> = (first_year..=current_year).collect();

        let counted = self.count_each(years, |year| PartitionFilter::Year(*year)).await?;
        Ok(counted
            .into_iter()
            .map(|c| ArchiveBucket {
                year: c.item,
                count: c.count,
            })
            .collect())
    }

    /// キーごとの件数を同時実行数を制限して取得する（入力順を保つ）
    async fn count_each<T, F>(&self, items: Vec<T>, to_filter: F) -> StoreResult<Vec<Counted<T>>>
    where
        F: Fn(&T) -> PartitionFilter,
    {
        tracing::debug!(
            keys = items.len(),
            concurrency = self.max_concurrency,
            "キーごとの件数を集計"
        );
        let articles = &self.articles;
        stream::iter(items)
            .map(|item| {
                let filters = ArticleFilters::partition(to_filter(&item));
                async move {
                    let count = articles.count_articles(&filters).await?;
                    Ok::<_, StoreError>(Counted { item, count })
                }
            })
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    /// モデルの全レコードをページを辿って取得する
    async fn fetch_all<T: DeserializeOwned>(&self, model_uid: &str) -> StoreResult<Vec<T>> {
        let mut records = Vec::new();
        let mut skip = 0;
        loop {
            let query = StoreQuery {
                skip,
                limit: ENTITY_PAGE_SIZE,
                depth: 1,
                ..StoreQuery::default()
            };
            let response = self.client.list_by_type(model_uid, &query).await?;
            let fetched = response.items.len() as u64;
            records.extend(decode_items::<T>(model_uid, response.items)?);
            skip += fetched;
            if fetched == 0 || skip >= response.total {
                break;
            }
        }
        Ok(records)
    }
}
