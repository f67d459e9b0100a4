use crate::types::{ConfigError, ConfigResult};
use chrono::FixedOffset;
use std::env;
use std::time::Duration;

/// 1ページあたりの既定件数
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// 既定のサイトタイムゾーン（UTC+9）
pub const DEFAULT_TIMEZONE: &str = "+09:00";

/// NewtのAPI種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiType {
    /// 公開コンテンツのみを返すCDN API
    Cdn,
    /// 下書きも取得できるAPI
    Api,
}

impl ApiType {
    fn host_segment(self) -> &'static str {
        match self {
            ApiType::Cdn => "cdn",
            ApiType::Api => "api",
        }
    }
}

/// サイトの分類軸（タグかカテゴリのどちらか一方のみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationAxis {
    Tags,
    Categories,
}

/// コンテンツモデルのUID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypes {
    pub article: String,
    pub author: String,
    pub tag: String,
    pub category: String,
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self {
            article: "article".to_string(),
            author: "author".to_string(),
            tag: "tag".to_string(),
            category: "category".to_string(),
        }
    }
}

/// ストアへの接続情報
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_token: String,
    pub app_uid: String,
    pub timeout: Duration,
}

/// サイト全体の設定
///
/// プロセス起動時に一度だけ作成し、各リポジトリへ明示的に渡す。
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub store: StoreConfig,
    pub content_types: ContentTypes,
    pub page_size: u32,
    pub timezone: FixedOffset,
    pub classification: ClassificationAxis,
    /// ストアへの同時リクエスト数の上限（1なら逐次実行）
    pub max_concurrency: usize,
}

impl SiteConfig {
    /// プロセスの環境変数から設定を読み込む
    /// .envの読み込みは呼び出し側（main）で行う
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require =
            |name: &str| get(name).ok_or_else(|| ConfigError::missing_env_var(name));

        let space_uid = require("NEWT_SPACE_UID")?;
        let api_token = require("NEWT_API_TOKEN")?;
        let app_uid = require("NEWT_APP_UID")?;

        let api_type = match get("NEWT_API_TYPE").as_deref() {
            None | Some("cdn") => ApiType::Cdn,
            Some("api") => ApiType::Api,
            Some(other) => {
                return Err(ConfigError::invalid_value(
                    "NEWT_API_TYPE",
                    other,
                    "cdn または api を指定してください",
                ))
            }
        };
        let base_url = get("NEWT_BASE_URL").unwrap_or_else(|| {
            format!("https://{}.{}.newt.so", space_uid, api_type.host_segment())
        });

        let defaults = ContentTypes::default();
        let content_types = ContentTypes {
            article: get("NEWT_ARTICLE_MODEL_UID").unwrap_or(defaults.article),
            author: get("NEWT_AUTHOR_MODEL_UID").unwrap_or(defaults.author),
            tag: get("NEWT_TAG_MODEL_UID").unwrap_or(defaults.tag),
            category: get("NEWT_CATEGORY_MODEL_UID").unwrap_or(defaults.category),
        };

        let page_size = parse_positive("PAGE_LIMIT", get("PAGE_LIMIT"), DEFAULT_PAGE_SIZE)?;
        let max_concurrency = parse_positive("STORE_MAX_CONCURRENCY", get("STORE_MAX_CONCURRENCY"), 1)?;
        let timeout_secs = parse_positive("STORE_TIMEOUT_SECS", get("STORE_TIMEOUT_SECS"), 30)?;

        let tz_raw = get("SITE_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = parse_offset(&tz_raw).ok_or_else(|| {
            ConfigError::invalid_value("SITE_TIMEZONE", tz_raw.as_str(), "+HH:MM 形式で指定してください")
        })?;

        let classification = match get("CLASSIFICATION").as_deref() {
            None | Some("tags") => ClassificationAxis::Tags,
            Some("categories") => ClassificationAxis::Categories,
            Some(other) => {
                return Err(ConfigError::invalid_value(
                    "CLASSIFICATION",
                    other,
                    "tags または categories を指定してください",
                ))
            }
        };

        Ok(Self {
            store: StoreConfig {
                base_url,
                api_token,
                app_uid,
                timeout: Duration::from_secs(timeout_secs),
            },
            content_types,
            page_size,
            timezone,
            classification,
            max_concurrency,
        })
    }
}

fn parse_positive<T>(name: &str, raw: Option<String>, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => Err(ConfigError::invalid_value(name, raw, "1以上の整数を指定してください")),
        },
    }
}

/// "+09:00" / "-05:30" / "Z" 形式のオフセットを解釈する
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
