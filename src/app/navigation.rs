use crate::domain::article::{Author, Term};
use crate::domain::{AggregateRepository, ArchiveBucket, Counted};
use crate::infra::ClassificationAxis;
use anyhow::{Context, Result};
use serde::Serialize;

/// サイドバーなどに表示するナビゲーション情報
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Navigation {
    /// 人気のタグ（カテゴリ運用のサイトではカテゴリ）
    pub popular_terms: Vec<Counted<Term>>,
    pub authors: Vec<Counted<Author>>,
    pub archives: Vec<ArchiveBucket>,
}

/// 人気順に並べる
///
/// 0件の項目を除き、件数の多い順に並べる。同数の場合は元の順序を保つ。
pub fn rank_by_popularity<T>(counts: Vec<Counted<T>>) -> Vec<Counted<T>> {
    let mut ranked: Vec<Counted<T>> = counts.into_iter().filter(|c| c.count > 0).collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// 集計結果からナビゲーション情報を組み立てる
pub async fn build_navigation(
    aggregates: &AggregateRepository,
    classification: ClassificationAxis,
) -> Result<Navigation> {
    let terms = match classification {
        ClassificationAxis::Tags => aggregates.tag_counts().await.context("タグ集計に失敗")?,
        ClassificationAxis::Categories => aggregates
            .category_counts()
            .await
            .context("カテゴリ集計に失敗")?,
    };
    let authors = aggregates.author_counts().await.context("著者集計に失敗")?;
    let archives = aggregates
        .yearly_archive()
        .await
        .context("年別アーカイブの集計に失敗")?;

    Ok(Navigation {
        popular_terms: rank_by_popularity(terms),
        authors,
        archives,
    })
}
