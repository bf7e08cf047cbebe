/// 感情分析ハンドラー
///
/// GET /sentiment/{id} で指定IDの全レコードの本文を感情検出にかけ、
/// 結果をレコードへ書き戻す。
use lambda_http::http::{Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use super::http_response::{error_response, json_response};
use crate::infrastructure::{
    DetectorError, FeedbackReader, FeedbackWriter, RepositoryError, SentimentDetector,
};

/// 感情分析処理のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictSentimentError {
    /// パスパラメータidが空
    #[error("Path parameter id is required")]
    MissingId,

    /// ストア操作に失敗
    #[error("Failed to access feedback: {0}")]
    Repository(#[from] RepositoryError),

    /// 感情検出に失敗
    #[error("Sentiment detection failed: {0}")]
    Detector(#[from] DetectorError),
}

impl PredictSentimentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictSentimentError::MissingId => StatusCode::BAD_REQUEST,
            PredictSentimentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PredictSentimentError::Detector(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// 感情分析ハンドラー
pub struct PredictSentimentHandler<S, D>
where
    S: FeedbackReader + FeedbackWriter,
    D: SentimentDetector,
{
    store: S,
    detector: D,
}

impl<S, D> PredictSentimentHandler<S, D>
where
    S: FeedbackReader + FeedbackWriter,
    D: SentimentDetector,
{
    pub fn new(store: S, detector: D) -> Self {
        Self { store, detector }
    }

    /// 指定IDのレコードを分析し、`{ID, PostedTime, Sentiment, SentimentScore}`の配列を返す
    ///
    /// 本文の無いレコードは飛ばす。該当レコードが無ければ空配列。
    /// 途中で失敗した場合、それまでに書き込んだ結果はそのまま残る。
    pub async fn handle(&self, id: Option<&str>) -> Result<Vec<Value>, PredictSentimentError> {
        let id = id
            .filter(|id| !id.trim().is_empty())
            .ok_or(PredictSentimentError::MissingId)?;

        let records = self.store.list_by_id(id).await?;
        let mut results = Vec::with_capacity(records.len());

        for record in &records {
            let Some(text) = record.feedback_text() else {
                continue;
            };

            let analysis = self.detector.detect(text).await?;
            self.store
                .record_sentiment(&record.key(), &analysis)
                .await?;

            info!(
                id = %record.id,
                posted_time = %record.posted_time,
                sentiment = %analysis.sentiment,
                "感情分析結果を記録"
            );
            results.push(record.sentiment_summary(&analysis));
        }

        Ok(results)
    }

    /// 分析を実行してHTTPレスポンスを返す
    pub async fn respond(&self, id: Option<&str>) -> Response<String> {
        match self.handle(id).await {
            Ok(results) => {
                info!(count = results.len(), "感情分析完了");
                json_response(StatusCode::OK, &Value::Array(results))
            }
            Err(err @ PredictSentimentError::MissingId) => {
                warn!(error = %err, "idが指定されていません");
                error_response(err.status_code(), err.to_string())
            }
            Err(err) => {
                error!(error = %err, "感情分析失敗");
                error_response(err.status_code(), err.to_string())
            }
        }
    }
}
