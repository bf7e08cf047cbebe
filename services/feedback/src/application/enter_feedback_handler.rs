/// フィードバック登録ハンドラー
///
/// POST / のボディを1件のフィードバックレコードとして保存する。
use chrono::{DateTime, Utc};
use lambda_http::http::{Response, StatusCode};
use thiserror::Error;
use tracing::{error, info, warn};

use super::http_response::{error_response, json_response};
use crate::domain::{FeedbackKey, FeedbackRecord, SubmissionError};
use crate::infrastructure::{FeedbackWriter, RepositoryError};

/// 登録処理のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubmitFeedbackError {
    /// ボディが不正
    #[error(transparent)]
    InvalidSubmission(#[from] SubmissionError),

    /// 保存に失敗
    #[error("Failed to store feedback: {0}")]
    Repository(#[from] RepositoryError),
}

impl SubmitFeedbackError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubmitFeedbackError::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
            SubmitFeedbackError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// フィードバック登録ハンドラー
pub struct EnterFeedbackHandler<W>
where
    W: FeedbackWriter,
{
    writer: W,
}

impl<W> EnterFeedbackHandler<W>
where
    W: FeedbackWriter,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// ボディを解釈してレコードを保存し、保存したキーを返す
    ///
    /// 同じキーのレコードがあれば上書きする。
    pub async fn handle(
        &self,
        body: Option<&[u8]>,
        now: DateTime<Utc>,
    ) -> Result<FeedbackKey, SubmitFeedbackError> {
        let record = FeedbackRecord::from_submission(body, now)?;
        self.writer.put(&record).await?;
        Ok(record.key())
    }

    /// 登録を実行してHTTPレスポンスを返す
    ///
    /// 成功時は201と`{"ID", "PostedTime"}`。
    pub async fn respond(&self, body: Option<&[u8]>, now: DateTime<Utc>) -> Response<String> {
        match self.handle(body, now).await {
            Ok(key) => {
                info!(id = %key.id, posted_time = %key.posted_time, "フィードバック保存");
                match serde_json::to_value(&key) {
                    Ok(value) => json_response(StatusCode::CREATED, &value),
                    Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
                }
            }
            Err(err @ SubmitFeedbackError::InvalidSubmission(_)) => {
                warn!(error = %err, "不正なフィードバック");
                error_response(err.status_code(), err.to_string())
            }
            Err(err) => {
                error!(error = %err, "フィードバック保存失敗");
                error_response(err.status_code(), err.to_string())
            }
        }
    }
}
