//! コンテンツストアのクエリ語彙
//!
//! フィルタ・ソート・ページングをストア非依存の構造体で表し、
//! Newtのクエリ文字列への変換もここで行う。

use serde_json::{json, Value};
use std::fmt;

/// 範囲条件の演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Gte => "gte",
            RangeOp::Lt => "lt",
            RangeOp::Lte => "lte",
        }
    }
}

/// フィルタ条件
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// フィールドの一致（参照フィールドではIDの一致）
    Eq { field: String, value: String },
    /// いずれかの値に一致
    In { field: String, values: Vec<String> },
    /// 範囲条件
    Range {
        field: String,
        op: RangeOp,
        value: String,
    },
    /// 部分一致（あいまい検索の扱いはストアに委ねる）
    Match { field: String, term: String },
    /// 子条件のいずれかを満たす
    Or(Vec<Condition>),
}

impl Condition {
    pub fn eq(field: &str, value: &str) -> Self {
        Self::Eq {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn range(field: &str, op: RangeOp, value: impl Into<String>) -> Self {
        Self::Range {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn matches(field: &str, term: &str) -> Self {
        Self::Match {
            field: field.to_string(),
            term: term.to_string(),
        }
    }

    /// `or`パラメータに埋め込むJSON表現
    fn to_json(&self) -> Value {
        match self {
            Condition::Eq { field, value } => json!({ field.as_str(): value }),
            Condition::In { field, values } => json!({ field.as_str(): { "in": values } }),
            Condition::Range { field, op, value } => {
                json!({ field.as_str(): { op.as_str(): value } })
            }
            Condition::Match { field, term } => json!({ field.as_str(): { "match": term } }),
            Condition::Or(children) => {
                json!({ "or": children.iter().map(Condition::to_json).collect::<Vec<_>>() })
            }
        }
    }

    fn push_pairs(&self, pairs: &mut Vec<(String, String)>) {
        match self {
            Condition::Eq { field, value } => pairs.push((field.clone(), value.clone())),
            Condition::In { field, values } => {
                pairs.push((format!("{}[in]", field), values.join(",")))
            }
            Condition::Range { field, op, value } => {
                pairs.push((format!("{}[{}]", field, op.as_str()), value.clone()))
            }
            Condition::Match { field, term } => {
                pairs.push((format!("{}[match]", field), term.clone()))
            }
            Condition::Or(children) => {
                let array: Vec<Value> = children.iter().map(Condition::to_json).collect();
                pairs.push(("or".to_string(), Value::Array(array).to_string()));
            }
        }
    }
}

/// ソート方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// ソートキー。表示形式は降順なら`-`接頭辞
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "{}", self.field),
            SortDirection::Desc => write!(f, "-{}", self.field),
        }
    }
}

/// 一覧取得クエリ
///
/// `filter`の各条件はANDで結合される。
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub filter: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub skip: u64,
    pub limit: u64,
    /// 参照フィールドを何階層まで展開するか
    pub depth: u8,
    /// 取得するフィールド（Noneなら全フィールド）
    pub select: Option<Vec<String>>,
}

impl Default for StoreQuery {
    fn default() -> Self {
        Self {
            filter: Vec::new(),
            sort: Vec::new(),
            skip: 0,
            limit: 100,
            depth: 1,
            select: None,
        }
    }
}

impl StoreQuery {
    /// Newtのクエリ文字列パラメータへ変換する
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for condition in &self.filter {
            condition.push_pairs(&mut pairs);
        }
        if !self.sort.is_empty() {
            let order: Vec<String> = self.sort.iter().map(SortKey::to_string).collect();
            pairs.push(("order".to_string(), order.join(",")));
        }
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.join(",")));
        }
        pairs.push(("skip".to_string(), self.skip.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs.push(("depth".to_string(), self.depth.to_string()));
        pairs
    }
}
