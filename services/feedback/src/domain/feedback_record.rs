//! フィードバックレコード
//!
//! (ID, PostedTime) の組で一意に識別される1件の顧客フィードバック。
//! キー以外の属性はスキーマレスで、任意のJSON値をそのまま保持する。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::sentiment::SentimentAnalysis;

/// パーティションキー属性名
pub const PARTITION_KEY: &str = "ID";

/// ソートキー属性名
pub const SORT_KEY: &str = "PostedTime";

/// フィードバック本文の属性名
pub const FEEDBACK_ATTRIBUTE: &str = "Feedback";

/// `Feedback`が無い場合に本文として扱う属性名
pub const FEEDBACK_TEXT_ALIAS: &str = "text";

/// 感情ラベルの属性名
pub const SENTIMENT_ATTRIBUTE: &str = "Sentiment";

/// 感情スコアの属性名
pub const SENTIMENT_SCORE_ATTRIBUTE: &str = "SentimentScore";

/// 投稿ボディの解釈エラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubmissionError {
    /// ボディが空
    #[error("Request body is missing")]
    MissingBody,

    /// UTF-8として不正
    #[error("Request body is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    /// JSONとして不正
    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(String),

    /// JSONオブジェクト以外
    #[error("Request body must be a JSON object")]
    NotAnObject,

    /// キー属性が空白のみ・空文字または文字列以外
    #[error("{0} must be a non-empty string")]
    InvalidKeyAttribute(&'static str),
}

/// フィードバックレコードのキー
///
/// 導出される`Ord`は (ID, PostedTime) の辞書順で、ストアのソート順と一致する。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedbackKey {
    /// 顧客ID
    #[serde(rename = "ID")]
    pub id: String,
    /// 投稿時刻
    #[serde(rename = "PostedTime")]
    pub posted_time: String,
}

impl FeedbackKey {
    /// 新しいキーを作成
    pub fn new(id: impl Into<String>, posted_time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            posted_time: posted_time.into(),
        }
    }
}

/// フィードバックレコード
///
/// JSON/DynamoDBアイテム上ではキー属性と任意属性が同じ階層に並ぶ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// 顧客ID（パーティションキー）
    #[serde(rename = "ID")]
    pub id: String,
    /// 投稿時刻（ソートキー）
    #[serde(rename = "PostedTime")]
    pub posted_time: String,
    /// キー以外の属性
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl FeedbackRecord {
    /// 属性なしのレコードを作成
    pub fn new(id: impl Into<String>, posted_time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            posted_time: posted_time.into(),
            attributes: Map::new(),
        }
    }

    /// 属性を追加したレコードを返す
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// レコードのキーを取得
    pub fn key(&self) -> FeedbackKey {
        FeedbackKey::new(self.id.clone(), self.posted_time.clone())
    }

    /// 感情分析の対象となる本文を取得
    ///
    /// `Feedback`を優先し、無ければ`text`を参照する。空白のみの本文は無視する。
    pub fn feedback_text(&self) -> Option<&str> {
        [FEEDBACK_ATTRIBUTE, FEEDBACK_TEXT_ALIAS]
            .iter()
            .filter_map(|name| self.attributes.get(*name).and_then(Value::as_str))
            .find(|text| !text.trim().is_empty())
    }

    /// 記録済みの感情ラベルを取得
    pub fn sentiment(&self) -> Option<&str> {
        self.attributes
            .get(SENTIMENT_ATTRIBUTE)
            .and_then(Value::as_str)
    }

    /// 感情分析結果を属性として書き込む
    pub fn apply_sentiment(&mut self, analysis: &SentimentAnalysis) {
        self.attributes.insert(
            SENTIMENT_ATTRIBUTE.to_string(),
            Value::String(analysis.sentiment.as_str().to_string()),
        );
        self.attributes.insert(
            SENTIMENT_SCORE_ATTRIBUTE.to_string(),
            json!(analysis.score),
        );
    }

    /// 感情分析結果の要約（キー・ラベル・スコア）をJSONで返す
    pub fn sentiment_summary(&self, analysis: &SentimentAnalysis) -> Value {
        json!({
            PARTITION_KEY: self.id,
            SORT_KEY: self.posted_time,
            SENTIMENT_ATTRIBUTE: analysis.sentiment.as_str(),
            SENTIMENT_SCORE_ATTRIBUTE: analysis.score,
        })
    }

    /// POSTボディからレコードを組み立てる
    ///
    /// - `ID`が無ければUUID v4を採番する
    /// - `PostedTime`が無ければ`now`をマイクロ秒精度のRFC 3339で使う
    /// - 空文字の`Feedback`は保存しない
    /// - それ以外の属性はそのまま保持する
    pub fn from_submission(body: Option<&[u8]>, now: DateTime<Utc>) -> Result<Self, SubmissionError> {
        let body = body
            .map(std::str::from_utf8)
            .transpose()
            .map_err(|e| SubmissionError::InvalidEncoding(e.to_string()))?
            .filter(|b| !b.trim().is_empty())
            .ok_or(SubmissionError::MissingBody)?;

        let value: Value = serde_json::from_str(body)
            .map_err(|e| SubmissionError::InvalidJson(e.to_string()))?;

        let Value::Object(mut attributes) = value else {
            return Err(SubmissionError::NotAnObject);
        };

        let id = take_key_attribute(&mut attributes, PARTITION_KEY)?
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let posted_time = take_key_attribute(&mut attributes, SORT_KEY)?
            .unwrap_or_else(|| format_posted_time(now));

        if attributes.get(FEEDBACK_ATTRIBUTE).and_then(Value::as_str) == Some("") {
            attributes.remove(FEEDBACK_ATTRIBUTE);
        }

        Ok(Self {
            id,
            posted_time,
            attributes,
        })
    }
}

/// PostedTimeの書式（UTC、マイクロ秒精度）
pub fn format_posted_time(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// キー属性を取り出す（未指定・nullはNone、空白のみはエラー）
fn take_key_attribute(
    attributes: &mut Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, SubmissionError> {
    match attributes.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s)),
        Some(_) => Err(SubmissionError::InvalidKeyAttribute(name)),
    }
}
