use super::query::StoreQuery;
use crate::infra::config::StoreConfig;
use crate::types::{StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 一覧取得のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// 画像参照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
}

/// アプリ（サイト）のメタ情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMeta {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cover: Option<ImageRef>,
}

impl AppMeta {
    /// 表示名（未設定ならUID）
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.uid)
    }
}

/// コンテンツストアクライアントの抽象化トレイト
///
/// 本番のHTTP実装とテスト用のインメモリ実装を統一的に扱うためのインターフェース。
/// アイテムは生のJSONで返し、型への変換はリポジトリ側で行う。
#[async_trait]
pub trait ContentStoreClient: Send + Sync {
    /// 指定モデルのコンテンツを一覧取得する
    async fn list_by_type(&self, type_id: &str, query: &StoreQuery)
        -> StoreResult<ListResponse<Value>>;

    /// アプリのメタ情報を取得する
    async fn get_app(&self) -> StoreResult<AppMeta>;
}

/// `reqwest`を使用したNewt向けクライアント
pub struct ReqwestContentStoreClient {
    client: Client,
    config: StoreConfig,
}

impl ReqwestContentStoreClient {
    /// 新しいクライアントを作成
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::transport(config.base_url.clone(), e))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json(&self, url: &str, pairs: &[(String, String)]) -> StoreResult<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_token)
            .query(pairs)
            .send()
            .await
            .map_err(|e| StoreError::transport(url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::transport(url, e))?;
        if !status.is_success() {
            return Err(StoreError::status(url, status.as_u16(), body));
        }
        serde_json::from_str(&body).map_err(|e| StoreError::decode(url, e))
    }
}

#[async_trait]
impl ContentStoreClient for ReqwestContentStoreClient {
    async fn list_by_type(
        &self,
        type_id: &str,
        query: &StoreQuery,
    ) -> StoreResult<ListResponse<Value>> {
        let url = self.url(&format!("{}/{}", self.config.app_uid, type_id));
        tracing::debug!(
            model = type_id,
            skip = query.skip,
            limit = query.limit,
            "コンテンツ一覧を取得"
        );
        let body = self.get_json(&url, &query.to_query_pairs()).await?;
        serde_json::from_value(body).map_err(|e| StoreError::decode(format!("{}の一覧", type_id), e))
    }

    async fn get_app(&self) -> StoreResult<AppMeta> {
        let url = self.url(&format!("space/apps/{}", self.config.app_uid));
        tracing::debug!(app = %self.config.app_uid, "アプリ情報を取得");
        let body = self.get_json(&url, &[]).await?;
        serde_json::from_value(body).map_err(|e| StoreError::decode("アプリ情報", e))
    }
}
