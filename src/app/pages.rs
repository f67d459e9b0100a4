use crate::domain::article::{Article, ArticlePage, ArticleRepository};
use crate::domain::{
    enumerate_pages, page_count, ArticleFilters, Direction, PageDescriptor, Pagination,
    PartitionKey,
};
use anyhow::{Context, Result};

/// 一覧ページ1枚分のデータ
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub partition: PartitionKey,
    pub page: u32,
    pub articles: ArticlePage,
    /// ページ送りのリンク（現在のページに印付き）
    pub pagination: Vec<PageDescriptor>,
}

/// 記事ページ1枚分のデータ
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleView {
    pub article: Article,
    pub previous: Option<Article>,
    pub next: Option<Article>,
}

/// 絞り込み軸とページ番号から一覧ページのデータを取得する
///
/// ページ番号が0以下の場合は1ページ目として扱う。
pub async fn load_list_page(
    repo: &ArticleRepository,
    partition: &PartitionKey,
    page: i64,
) -> Result<ListPage> {
    let page_size = repo.builder().page_size;
    let pagination = Pagination::normalized(page, i64::from(page_size), page_size);
    let filters = ArticleFilters {
        search: None,
        partition: partition.filter(),
    };
    let articles = repo
        .list_articles(&filters, Some(pagination))
        .await
        .with_context(|| format!("一覧の取得に失敗: {}", partition.base_path()))?;

    let links = enumerate_pages(articles.total, pagination.limit, Some(pagination.page))
        .into_iter()
        .map(|mut descriptor| {
            descriptor.partition = partition.clone();
            descriptor
        })
        .collect();

    Ok(ListPage {
        partition: partition.clone(),
        page: pagination.page,
        articles,
        pagination: links,
    })
}

/// 検索結果を取得する
pub async fn search_articles(
    repo: &ArticleRepository,
    term: &str,
    page: i64,
    limit: i64,
) -> Result<(ArticlePage, u32)> {
    let default = repo.builder().page_size;
    let pagination = Pagination::normalized(page, limit, default);
    let result = repo
        .list_articles(&ArticleFilters::search(term), Some(pagination))
        .await
        .with_context(|| format!("検索に失敗: {}", term))?;
    let pages = page_count(result.total, pagination.limit);
    Ok((result, pages))
}

/// スラッグから記事ページのデータを取得する
///
/// 記事が存在しなければ`None`（前後記事も取得しない）。
pub async fn load_article_view(repo: &ArticleRepository, slug: &str) -> Result<Option<ArticleView>> {
    let Some(article) = repo
        .get_article_by_slug(slug)
        .await
        .with_context(|| format!("記事の取得に失敗: {}", slug))?
    else {
        return Ok(None);
    };

    let created_at = article.created_at();
    let previous = repo
        .get_adjacent_article(Direction::Previous, created_at)
        .await
        .context("前の記事の取得に失敗")?;
    let next = repo
        .get_adjacent_article(Direction::Next, created_at)
        .await
        .context("次の記事の取得に失敗")?;

    Ok(Some(ArticleView {
        article,
        previous,
        next,
    }))
}
