use thiserror::Error;

/// コンテンツストア呼び出しのエラー型
///
/// 「見つからない」はエラーではなく`Option::None`で表現するため、ここには含めない。
/// このエラーが返った場合、そのページのビルドは失敗として扱う。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 通信エラー（接続失敗・タイムアウトなど）
    #[error("コンテンツストアへの通信に失敗: {url} - {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 2xx以外のステータス
    #[error("コンテンツストアがエラーを返しました: {url} (status {status}) {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// レスポンスのデコード失敗
    #[error("レスポンスのデコードに失敗: {context} - {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// 通信エラーを作成
    pub fn transport<U: Into<String>>(url: U, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// ステータスエラーを作成
    pub fn status<U: Into<String>, B: Into<String>>(url: U, status: u16, body: B) -> Self {
        Self::Status {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// デコードエラーを作成
    pub fn decode<C: Into<String>>(context: C, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    /// ストアが利用できない状態（通信失敗・5xx）かどうか
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode { .. } => false,
        }
    }
}

/// ストアエラーのResult型エイリアス
pub type StoreResult<T> = std::result::Result<T, StoreError>;
