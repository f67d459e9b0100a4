use crate::infra::api::ImageRef;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// 著者名が取得できない場合の表示名
pub const NO_AUTHOR_NAME: &str = "NO NAME";

/// システム管理フィールド
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SysMeta {
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<FixedOffset>>,
}

/// 参照フィールド
///
/// 展開深さが足りない場合はIDの文字列のみが返る。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Resolved(T),
    Id(String),
}

impl<T: HasId> Reference<T> {
    pub fn id(&self) -> &str {
        match self {
            Reference::Resolved(item) => item.id(),
            Reference::Id(id) => id,
        }
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Reference::Resolved(item) => Some(item),
            Reference::Id(_) => None,
        }
    }
}

/// IDを持つコンテンツ
pub trait HasId {
    fn id(&self) -> &str;
}

/// タグ・カテゴリ共通の分類項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub name: String,
}

pub type Tag = Term;
pub type Category = Term;

impl HasId for Term {
    fn id(&self) -> &str {
        &self.id
    }
}

// 著者エンティティ（ストア側で管理される参照データ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(rename = "profileImage", default)]
    pub profile_image: Option<ImageRef>,
    #[serde(default)]
    pub biography: String,
}

impl HasId for Author {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Author {
    /// 表示名（未設定なら"NO NAME"）
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(NO_AUTHOR_NAME)
    }
}

/// 記事ごとのSEO上書き設定
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeoMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "ogImage", default)]
    pub og_image: Option<ImageRef>,
}

// 記事エンティティ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_sys")]
    pub sys: SysMeta,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "coverImage", default)]
    pub cover_image: Option<ImageRef>,
    #[serde(default)]
    pub meta: Option<SeoMeta>,
    #[serde(default)]
    pub author: Option<Reference<Author>>,
    #[serde(default)]
    pub tags: Vec<Reference<Tag>>,
    #[serde(default)]
    pub categories: Vec<Reference<Category>>,
}

impl HasId for Article {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Article {
    /// 作成日時（並び順・絞り込みの基準）
    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.sys.created_at
    }

    /// 展開済みの著者
    pub fn resolved_author(&self) -> Option<&Author> {
        self.author.as_ref().and_then(Reference::resolved)
    }

    /// 著者の表示名
    ///
    /// 著者が未設定、または展開されていない場合は"NO NAME"を返す。
    pub fn author_name(&self) -> &str {
        self.resolved_author()
            .map(Author::display_name)
            .unwrap_or(NO_AUTHOR_NAME)
    }

    /// 展開済みのタグ
    pub fn resolved_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter_map(Reference::resolved)
    }

    /// 展開済みのカテゴリ
    pub fn resolved_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter_map(Reference::resolved)
    }

    /// 記事ページの表示タイトル（SEO設定があればそちらを優先）
    pub fn seo_title(&self) -> &str {
        self.meta
            .as_ref()
            .and_then(|m| m.title.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }

    /// OGP画像（SEO設定がなければ著者のプロフィール画像）
    pub fn og_image(&self) -> Option<&ImageRef> {
        self.meta
            .as_ref()
            .and_then(|m| m.og_image.as_ref())
            .or_else(|| self.resolved_author().and_then(|a| a.profile_image.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_resolved_and_unresolved_references() {
        let article: Article = serde_json::from_value(json!({
            "_id": "a1",
            "_sys": { "createdAt": "2023-06-15T00:00:00+09:00" },
            "slug": "hello",
            "title": "Hello",
            "body": "<p>hi</p>",
            "coverImage": null,
            "author": "author-1",
            "tags": [
                { "_id": "t1", "slug": "rust", "name": "Rust" },
                "t2"
            ]
        }))
        .unwrap();

        assert_eq!(article.author.as_ref().map(Reference::id), Some("author-1"));
        assert!(article.resolved_author().is_none());
        assert_eq!(article.author_name(), NO_AUTHOR_NAME);
        assert_eq!(article.tags[0].id(), "t1");
        assert_eq!(article.tags[1].id(), "t2");
        assert_eq!(article.resolved_tags().count(), 1);
        assert!(article.categories.is_empty());
        assert!(article.cover_image.is_none());
    }

    #[test]
    fn test_author_name_fallbacks() {
        let author = Author {
            id: "au1".to_string(),
            slug: "taro".to_string(),
            full_name: Some(String::new()),
            profile_image: Some(ImageRef {
                src: "https://img/taro.png".to_string(),
            }),
            biography: String::new(),
        };
        assert_eq!(author.display_name(), NO_AUTHOR_NAME);

        let named = Author {
            full_name: Some("Taro".to_string()),
            ..author.clone()
        };
        assert_eq!(named.display_name(), "Taro");

        let article: Article = serde_json::from_value(json!({
            "_id": "a1",
            "_sys": { "createdAt": "2023-06-15T00:00:00+09:00" },
            "slug": "hello",
            "title": "Hello",
            "meta": { "title": "", "description": null, "ogImage": null },
            "author": named,
        }))
        .unwrap();
        assert_eq!(article.author_name(), "Taro");
        assert_eq!(article.seo_title(), "Hello");
        assert_eq!(
            article.og_image().map(|i| i.src.as_str()),
            Some("https://img/taro.png")
        );
    }
}
