use super::query::{Condition, RangeOp, SortDirection, StoreQuery};
use super::store::{AppMeta, ContentStoreClient, ListResponse};
use crate::types::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, RwLock};

/// メモリ上のレコードに対してクエリを評価するコンテンツストア
///
/// テストやデモでDIされ、実際のHTTP通信を行わずにNewtと同じ
/// フィルタ・ソート・ページングの意味論を再現する。
/// 参照フィールドは登録されたJSONのまま返す（展開深さは評価しない）。
pub struct InMemoryContentStore {
    app: AppMeta,
    records: RwLock<HashMap<String, Vec<Value>>>,
    /// 設定されている場合、全リクエストをこのステータスで失敗させる
    failure_status: Mutex<Option<u16>>,
    requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryContentStore {
    pub fn new(app_uid: &str) -> Self {
        Self {
            app: AppMeta {
                uid: app_uid.to_string(),
                name: None,
                cover: None,
            },
            records: RwLock::new(HashMap::new()),
            failure_status: Mutex::new(None),
            requests: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_app(mut self, app: AppMeta) -> Self {
        self.app = app;
        self
    }

    /// レコードを登録する
    pub fn insert(&self, type_id: &str, record: Value) {
        if let Ok(mut records) = self.records.write() {
            records.entry(type_id.to_string()).or_default().push(record);
        }
    }

    /// 以降のリクエストを指定ステータスで失敗させる（Noneで解除）
    pub fn set_failure(&self, status: Option<u16>) {
        if let Ok(mut failure) = self.failure_status.lock() {
            *failure = status;
        }
    }

    /// これまでに受けたリクエスト数
    pub fn request_count(&self) -> usize {
        self.requests.load(AtomicOrdering::SeqCst)
    }

    /// 同時に処理中だったリクエスト数の最大値
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(AtomicOrdering::SeqCst)
    }

    fn evaluate(&self, type_id: &str, query: &StoreQuery) -> ListResponse<Value> {
        let records = match self.records.read() {
            Ok(records) => records.get(type_id).cloned().unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        let mut matched: Vec<Value> = records
            .into_iter()
            .filter(|record| query.filter.iter().all(|c| satisfies(record, c)))
            .collect();

        matched.sort_by(|a, b| {
            query
                .sort
                .iter()
                .map(|key| {
                    let ord = compare_options(lookup(a, &key.field), lookup(b, &key.field));
                    match key.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .map(|record| project(record, query.select.as_deref()))
            .collect();

        ListResponse { items, total }
    }

    async fn track<T>(&self, result: impl FnOnce() -> StoreResult<T>) -> StoreResult<T> {
        self.requests.fetch_add(1, AtomicOrdering::SeqCst);
        let now = self.in_flight.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, AtomicOrdering::SeqCst);
        // 他のリクエストと重なる余地を作る
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, AtomicOrdering::SeqCst);

        let failure = self.failure_status.lock().ok().and_then(|f| *f);
        match failure {
            Some(status) => Err(StoreError::status("memory://", status, "injected failure")),
            None => result(),
        }
    }
}

#[async_trait]
impl ContentStoreClient for InMemoryContentStore {
    async fn list_by_type(
        &self,
        type_id: &str,
        query: &StoreQuery,
    ) -> StoreResult<ListResponse<Value>> {
        self.track(|| Ok(self.evaluate(type_id, query))).await
    }

    async fn get_app(&self) -> StoreResult<AppMeta> {
        self.track(|| Ok(self.app.clone())).await
    }
}

/// ドット区切りのパスでフィールドを参照する
fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.get(segment))
}

/// 参照フィールドの値をID文字列として取り出す
fn scalar_ids(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().flat_map(scalar_ids).collect(),
        Value::Object(map) => map
            .get("_id")
            .and_then(Value::as_str)
            .map(|id| vec![id.to_string()])
            .unwrap_or_default(),
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Null => Vec::new(),
    }
}

fn satisfies(record: &Value, condition: &Condition) -> bool {
    match condition {
        Condition::Eq { field, value } => lookup(record, field)
            .map(|v| scalar_ids(v).iter().any(|id| id == value))
            .unwrap_or(false),
        Condition::In { field, values } => lookup(record, field)
            .map(|v| scalar_ids(v).iter().any(|id| values.contains(id)))
            .unwrap_or(false),
        Condition::Range { field, op, value } => {
            let Some(actual) = lookup(record, field) else {
                return false;
            };
            let ord = compare_values(actual, &Value::String(value.clone()));
            match op {
                RangeOp::Gt => ord == Ordering::Greater,
                RangeOp::Gte => ord != Ordering::Less,
                RangeOp::Lt => ord == Ordering::Less,
                RangeOp::Lte => ord != Ordering::Greater,
            }
        }
        Condition::Match { field, term } => lookup(record, field)
            .and_then(Value::as_str)
            .map(|text| text.to_lowercase().contains(&term.to_lowercase()))
            .unwrap_or(false),
        Condition::Or(children) => children.iter().any(|c| satisfies(record, c)),
    }
}

fn parse_datetime(value: &Value) -> Option<DateTime<FixedOffset>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

/// 日時・数値・文字列の順に比較を試みる
fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(a), Some(b)) = (parse_datetime(a), parse_datetime(b)) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    match (a.as_str(), b.as_str()) {
        (Some(a), Some(b)) => a.cmp(b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_options(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `select`指定のフィールドだけを残す
fn project(record: Value, select: Option<&[String]>) -> Value {
    match (select, record) {
        (Some(select), Value::Object(map)) => {
            let projected: Map<String, Value> = map
                .into_iter()
                .filter(|(key, _)| {
                    select
                        .iter()
                        .any(|s| s == key || s.split('.').next() == Some(key.as_str()))
                })
                .collect();
            Value::Object(projected)
        }
        (_, record) => record,
    }
}
