//! 記事クエリの組み立て
//!
//! 画面側の意図（検索語・タグ・著者・カテゴリ・年・ページ番号）を
//! コンテンツストアのフィルタ・ソート・ページング語彙に変換する。
//! 不正な入力はエラーにせず、安全な既定値に丸める。

use crate::infra::api::{Condition, RangeOp, SortKey, StoreQuery};
use crate::infra::SiteConfig;
use chrono::{FixedOffset, NaiveDate, SecondsFormat, TimeZone};

/// 作成日時フィールド
pub const CREATED_AT: &str = "_sys.createdAt";
/// IDフィールド
pub const ID: &str = "_id";

/// 一覧表示の展開深さ
pub const LIST_DEPTH: u8 = 1;
/// 記事詳細の展開深さ（著者の画像など入れ子の参照まで解決する）
pub const DETAIL_DEPTH: u8 = 2;

/// 絞り込みの軸（同時に指定できるのは1つだけ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionFilter {
    Tag(String),
    Author(String),
    Category(String),
    Year(i32),
}

/// 記事一覧の絞り込み条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilters {
    pub search: Option<String>,
    pub partition: Option<PartitionFilter>,
}

impl ArticleFilters {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn search(term: &str) -> Self {
        Self {
            search: Some(term.to_string()),
            partition: None,
        }
    }

    pub fn partition(partition: PartitionFilter) -> Self {
        Self {
            search: None,
            partition: Some(partition),
        }
    }

    pub fn with_partition(mut self, partition: PartitionFilter) -> Self {
        self.partition = Some(partition);
        self
    }
}

/// ページ指定（1始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// 範囲外の値を丸めて作成する
    ///
    /// ページが1未満なら1、件数が1未満なら`default_limit`を使う。
    pub fn normalized(page: i64, limit: i64, default_limit: u32) -> Self {
        let page = u32::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let limit = u32::try_from(limit)
            .ok()
            .filter(|l| *l >= 1)
            .unwrap_or(default_limit.max(1));
        Self { page, limit }
    }

    pub fn first(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
        }
    }

    pub fn skip(&self) -> u64 {
        (u64::from(self.page.max(1)) - 1) * u64::from(self.limit)
    }
}

/// 前後どちらの記事を取得するか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// クエリビルダー
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    pub page_size: u32,
    pub timezone: FixedOffset,
}

impl QueryBuilder {
    pub fn new(page_size: u32, timezone: FixedOffset) -> Self {
        Self {
            page_size: page_size.max(1),
            timezone,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.page_size, config.timezone)
    }

    /// 既定のページ指定（1ページ目・設定の件数）
    pub fn default_pagination(&self) -> Pagination {
        Pagination::first(self.page_size)
    }

    /// 記事一覧クエリを組み立てる
    pub fn build_article_query(
        &self,
        filters: &ArticleFilters,
        pagination: Option<Pagination>,
    ) -> StoreQuery {
        let pagination = pagination.unwrap_or_else(|| self.default_pagination());
        let pagination = Pagination::normalized(
            i64::from(pagination.page),
            i64::from(pagination.limit),
            self.page_size,
        );

        StoreQuery {
            filter: self.conditions(filters),
            sort: newest_first(),
            skip: pagination.skip(),
            limit: u64::from(pagination.limit),
            depth: LIST_DEPTH,
            select: None,
        }
    }

    /// 件数のみを取得するクエリ
    pub fn build_count_query(&self, filters: &ArticleFilters) -> StoreQuery {
        StoreQuery {
            filter: self.conditions(filters),
            sort: Vec::new(),
            skip: 0,
            limit: 1,
            depth: 0,
            select: Some(vec![ID.to_string()]),
        }
    }

    /// スラッグで1件取得するクエリ
    pub fn build_slug_query(&self, slug: &str) -> StoreQuery {
        StoreQuery {
            filter: vec![Condition::eq("slug", slug)],
            sort: Vec::new(),
            skip: 0,
            limit: 1,
            depth: DETAIL_DEPTH,
            select: None,
        }
    }

    /// 基準日時の直前・直後の記事を1件取得するクエリ
    pub fn build_adjacent_query(
        &self,
        direction: Direction,
        reference: chrono::DateTime<FixedOffset>,
    ) -> StoreQuery {
        let timestamp = format_reference(reference);
        let (condition, sort) = match direction {
            Direction::Previous => (
                Condition::range(CREATED_AT, RangeOp::Lt, timestamp),
                newest_first(),
            ),
            Direction::Next => (
                Condition::range(CREATED_AT, RangeOp::Gt, timestamp),
                oldest_first(),
            ),
        };
        StoreQuery {
            filter: vec![condition],
            sort,
            skip: 0,
            limit: 1,
            depth: DETAIL_DEPTH,
            select: None,
        }
    }

    /// 最も古い記事を1件取得するクエリ
    pub fn build_oldest_query(&self) -> StoreQuery {
        StoreQuery {
            filter: Vec::new(),
            sort: oldest_first(),
            skip: 0,
            limit: 1,
            depth: 0,
            select: Some(vec![ID.to_string(), "_sys".to_string()]),
        }
    }

    /// スラッグ一覧を取得するクエリ
    pub fn build_slug_list_query(&self, skip: u64, limit: u64) -> StoreQuery {
        StoreQuery {
            filter: Vec::new(),
            sort: newest_first(),
            skip,
            limit,
            depth: 0,
            select: Some(vec![ID.to_string(), "slug".to_string()]),
        }
    }

    /// 年の範囲 `[y年1月1日 00:00, y+1年1月1日 00:00)` をサイトのタイムゾーンで返す
    pub fn year_range(&self, year: i32) -> Option<(String, String)> {
        let start = self.start_of_year(year)?;
        let end = self.start_of_year(year.checked_add(1)?)?;
        Some((start, end))
    }

    fn start_of_year(&self, year: i32) -> Option<String> {
        let midnight = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?;
        let local = self.timezone.from_local_datetime(&midnight).single()?;
        Some(format_boundary(local))
    }

    fn conditions(&self, filters: &ArticleFilters) -> Vec<Condition> {
        let mut conditions = Vec::new();

        if let Some(term) = filters.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            conditions.push(Condition::Or(vec![
                Condition::matches("title", term),
                Condition::matches("body", term),
            ]));
        }

        match &filters.partition {
            Some(PartitionFilter::Tag(id)) => push_relation(&mut conditions, "tags", id),
            Some(PartitionFilter::Author(id)) => push_relation(&mut conditions, "author", id),
            Some(PartitionFilter::Category(id)) => {
                push_relation(&mut conditions, "categories", id)
            }
            Some(PartitionFilter::Year(year)) => {
                if let Some((start, end)) = self.year_range(*year) {
                    conditions.push(Condition::range(CREATED_AT, RangeOp::Gte, start));
                    conditions.push(Condition::range(CREATED_AT, RangeOp::Lt, end));
                }
            }
            None => {}
        }

        conditions
    }
}

fn push_relation(conditions: &mut Vec<Condition>, field: &str, id: &str) {
    let id = id.trim();
    if !id.is_empty() {
        conditions.push(Condition::eq(field, id));
    }
}

fn newest_first() -> Vec<SortKey> {
    vec![SortKey::desc(CREATED_AT), SortKey::desc(ID)]
}

fn oldest_first() -> Vec<SortKey> {
    vec![SortKey::asc(CREATED_AT), SortKey::asc(ID)]
}

/// 年の境界（常に0時ちょうど）
fn format_boundary(dt: chrono::DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// 記事の作成日時。ストアの値はミリ秒を含むため秒未満を落とさない
fn format_reference(dt: chrono::DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
