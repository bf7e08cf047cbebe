/// DynamoDBでフィードバックレコードを管理するリポジトリ
///
/// 読み取り（FeedbackReader）と書き込み（FeedbackWriter）を別トレイトに分け、
/// 読み取り専用ハンドラーが書き込み操作を呼べないようにする。
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

use crate::domain::feedback_record::{
    PARTITION_KEY, SENTIMENT_ATTRIBUTE, SENTIMENT_SCORE_ATTRIBUTE, SORT_KEY,
};
use crate::domain::{FeedbackKey, FeedbackRecord, SentimentAnalysis};

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// ストアへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// ストアからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// アイテムとレコードの変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 更新対象のレコードが存在しない
    #[error("Record not found: ID={}, PostedTime={}", .0.id, .0.posted_time)]
    NotFound(FeedbackKey),
}

/// フィードバックの読み取り操作
#[async_trait]
pub trait FeedbackReader: Send + Sync {
    /// 全レコードを(ID, PostedTime)昇順で取得
    async fn list_all(&self) -> Result<Vec<FeedbackRecord>, RepositoryError>;

    /// 指定IDのレコードをPostedTime昇順で取得
    async fn list_by_id(&self, id: &str) -> Result<Vec<FeedbackRecord>, RepositoryError>;
}

/// フィードバックの書き込み操作
#[async_trait]
pub trait FeedbackWriter: Send + Sync {
    /// レコードを保存（同じキーのレコードは上書き）
    async fn put(&self, record: &FeedbackRecord) -> Result<(), RepositoryError>;

    /// 既存レコードに感情分析結果を書き込む
    ///
    /// レコードが存在しない場合は`RepositoryError::NotFound`
    async fn record_sentiment(
        &self,
        key: &FeedbackKey,
        analysis: &SentimentAnalysis,
    ) -> Result<(), RepositoryError>;
}

/// DynamoDBアイテム
type Item = HashMap<String, AttributeValue>;

/// Scan / Queryの1ページ分の結果
#[derive(Debug, Default)]
struct ItemPage {
    items: Vec<Item>,
    last_evaluated_key: Option<Item>,
}

/// LastEvaluatedKeyが無くなるまでページを取得してレコードに変換する
///
/// `fetch_page`には前ページのLastEvaluatedKey（初回はNone）が渡される。
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<FeedbackRecord>, RepositoryError>
where
    F: FnMut(Option<Item>) -> Fut,
    Fut: Future<Output = Result<ItemPage, RepositoryError>>,
{
    let mut records = Vec::new();
    let mut start_key = None;

    loop {
        let page = fetch_page(start_key.take()).await?;

        for item in page.items {
            records.push(DynamoFeedbackRepository::from_item(item)?);
        }

        match page.last_evaluated_key {
            Some(key) => start_key = Some(key),
            None => break,
        }
    }

    Ok(records)
}

/// JSONで表現できない属性値を変換する
///
/// バイナリ（B / BS）はBase64文字列にする。マップ・リストの中も再帰的に変換する。
fn normalize_attribute(value: AttributeValue) -> AttributeValue {
    match value {
        AttributeValue::B(blob) => AttributeValue::S(BASE64.encode(blob.as_ref())),
        AttributeValue::Bs(blobs) => AttributeValue::Ss(
            blobs
                .iter()
                .map(|blob| BASE64.encode(blob.as_ref()))
                .collect(),
        ),
        AttributeValue::M(map) => AttributeValue::M(
            map.into_iter()
                .map(|(name, value)| (name, normalize_attribute(value)))
                .collect(),
        ),
        AttributeValue::L(list) => {
            AttributeValue::L(list.into_iter().map(normalize_attribute).collect())
        }
        other => other,
    }
}

/// FeedbackReader / FeedbackWriterのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoFeedbackRepository {
    /// DynamoDBクライアント
    client: DynamoDbClient,
    /// フィードバックテーブル名
    table_name: String,
}

impl DynamoFeedbackRepository {
    /// 新しいDynamoFeedbackRepositoryを作成
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// レコードをDynamoDBアイテムに変換
    pub(crate) fn to_item(record: &FeedbackRecord) -> Result<Item, RepositoryError> {
        serde_dynamo::to_item(record)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    /// DynamoDBアイテムをレコードに変換
    ///
    /// キー以外の属性はスキーマを持たないため、バイナリ属性も受け入れる。
    pub(crate) fn from_item(item: Item) -> Result<FeedbackRecord, RepositoryError> {
        let item: Item = item
            .into_iter()
            .map(|(name, value)| (name, normalize_attribute(value)))
            .collect();

        serde_dynamo::from_item(item)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    /// キー属性を構築
    fn key_attributes(key: &FeedbackKey) -> Item {
        HashMap::from([
            (PARTITION_KEY.to_string(), AttributeValue::S(key.id.clone())),
            (SORT_KEY.to_string(), AttributeValue::S(key.posted_time.clone())),
        ])
    }
}

#[async_trait]
impl FeedbackReader for DynamoFeedbackRepository {
    async fn list_all(&self) -> Result<Vec<FeedbackRecord>, RepositoryError> {
        let mut records = collect_pages(|start_key| {
            let request = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key);
            async move {
                request
                    .send()
                    .await
                    .map(|output| ItemPage {
                        items: output.items.unwrap_or_default(),
                        last_evaluated_key: output.last_evaluated_key,
                    })
                    .map_err(|e| RepositoryError::ReadError(e.into_service_error().to_string()))
            }
        })
        .await?;

        // スキャン結果はパーティション間で順序が保証されないため並べ替える
        records.sort_by(|a, b| a.key().cmp(&b.key()));

        debug!(count = records.len(), "フィードバックを全件取得");
        Ok(records)
    }

    async fn list_by_id(&self, id: &str) -> Result<Vec<FeedbackRecord>, RepositoryError> {
        let records = collect_pages(|start_key| {
            let request = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#id = :id")
                .expression_attribute_names("#id", PARTITION_KEY)
                .expression_attribute_values(":id", AttributeValue::S(id.to_string()))
                .set_exclusive_start_key(start_key);
            async move {
                request
                    .send()
                    .await
                    .map(|output| ItemPage {
                        items: output.items.unwrap_or_default(),
                        last_evaluated_key: output.last_evaluated_key,
                    })
                    .map_err(|e| RepositoryError::ReadError(e.into_service_error().to_string()))
            }
        })
        .await?;

        debug!(id = id, count = records.len(), "IDでフィードバックを取得");
        Ok(records)
    }
}

#[async_trait]
impl FeedbackWriter for DynamoFeedbackRepository {
    async fn put(&self, record: &FeedbackRecord) -> Result<(), RepositoryError> {
        let item = Self::to_item(record)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(e.into_service_error().to_string()))?;

        Ok(())
    }

    async fn record_sentiment(
        &self,
        key: &FeedbackKey,
        analysis: &SentimentAnalysis,
    ) -> Result<(), RepositoryError> {
        let score: AttributeValue = serde_dynamo::to_attribute_value(analysis.score)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key_attributes(key)))
            .update_expression("SET #sentiment = :sentiment, #score = :score")
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", PARTITION_KEY)
            .expression_attribute_names("#sentiment", SENTIMENT_ATTRIBUTE)
            .expression_attribute_names("#score", SENTIMENT_SCORE_ATTRIBUTE)
            .expression_attribute_values(
                ":sentiment",
                AttributeValue::S(analysis.sentiment.as_str().to_string()),
            )
            .expression_attribute_values(":score", score)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    return Err(RepositoryError::NotFound(key.clone()));
                }
                Err(RepositoryError::WriteError(service_error.to_string()))
            }
        }
    }
}
