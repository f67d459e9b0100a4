//! ページ列挙
//!
//! 取得済みの件数から、静的生成すべき（絞り込み軸, ページ番号）の組をすべて求める。
//! ここでは通信を行わない。

use crate::domain::query::PartitionFilter;
use serde::Serialize;
use std::fmt;

/// 分類項目の識別子（絞り込みにはID、パスにはスラッグを使う）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TermKey {
    pub id: String,
    pub slug: String,
}

impl TermKey {
    pub fn new(id: &str, slug: &str) -> Self {
        Self {
            id: id.to_string(),
            slug: slug.to_string(),
        }
    }
}

/// 一覧の絞り込み軸
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum PartitionKey {
    /// 絞り込みなし（トップの一覧）
    Global,
    Tag(TermKey),
    Author(TermKey),
    Category(TermKey),
    Year(i32),
}

impl PartitionKey {
    /// 対応する絞り込み条件
    pub fn filter(&self) -> Option<PartitionFilter> {
        match self {
            PartitionKey::Global => None,
            PartitionKey::Tag(key) => Some(PartitionFilter::Tag(key.id.clone())),
            PartitionKey::Author(key) => Some(PartitionFilter::Author(key.id.clone())),
            PartitionKey::Category(key) => Some(PartitionFilter::Category(key.id.clone())),
            PartitionKey::Year(year) => Some(PartitionFilter::Year(*year)),
        }
    }

    /// 一覧のベースパス（トップは空文字）
    pub fn base_path(&self) -> String {
        match self {
            PartitionKey::Global => String::new(),
            PartitionKey::Tag(key) => format!("/tag/{}", key.slug),
            PartitionKey::Author(key) => format!("/author/{}", key.slug),
            PartitionKey::Category(key) => format!("/category/{}", key.slug),
            PartitionKey::Year(year) => format!("/archive/{}", year),
        }
    }
}

/// 静的生成する1ページ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    pub partition: PartitionKey,
    /// 1始まりのページ番号
    pub page: u32,
    pub is_current: bool,
}

impl PageDescriptor {
    /// ページ番号付きのパス（例: /tag/rust/page/2）
    pub fn path(&self) -> String {
        format!("{}/page/{}", self.partition.base_path(), self.page)
    }

    /// ページ番号なしで到達できるパス。1ページ目だけが持つ
    pub fn index_path(&self) -> Option<String> {
        if self.page != 1 {
            return None;
        }
        let base = self.partition.base_path();
        Some(if base.is_empty() { "/".to_string() } else { base })
    }
}

impl fmt::Display for PageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// `ceil(total / limit)`。0件なら0ページ
pub fn page_count(total: u64, limit: u32) -> u32 {
    let pages = total.div_ceil(u64::from(limit.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// トップ一覧のページを列挙し、`current`に一致するページに印を付ける
pub fn enumerate_pages(total: u64, limit: u32, current: Option<u32>) -> Vec<PageDescriptor> {
    pages_for(PartitionKey::Global, total, limit, current)
}

/// 絞り込み軸ごとに件数からページ範囲を求め、すべてを平坦化して返す
///
/// `count_of`は取得済みの件数を返すだけの関数であること。
/// 0件の軸からはページを生成しない。
pub fn enumerate_partitioned_pages<F>(
    partitions: &[PartitionKey],
    mut count_of: F,
    limit: u32,
) -> Vec<PageDescriptor>
where
    F: FnMut(&PartitionKey) -> u64,
{
    partitions
        .iter()
        .flat_map(|partition| {
            let total = count_of(partition);
            pages_for(partition.clone(), total, limit, None)
        })
        .collect()
}

fn pages_for(
    partition: PartitionKey,
    total: u64,
    limit: u32,
    current: Option<u32>,
) -> Vec<PageDescriptor> {
    (1..=page_count(total, limit))
        .map(|page| PageDescriptor {
            partition: partition.clone(),
            page,
            is_current: current == Some(page),
        })
        .collect()
}
