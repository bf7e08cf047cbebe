// フィードバック全件取得ハンドラー
//
// 読み取り専用。FeedbackReaderしか受け取らないので書き込み操作は呼べない。

use lambda_http::http::{Response, StatusCode};
use tracing::{error, info};

use super::http_response::{error_response, json_response};
use crate::domain::FeedbackRecord;
use crate::infrastructure::{FeedbackReader, RepositoryError};

/// 取得処理のエラー型
#[derive(Debug, Clone, PartialEq)]
pub enum ListFeedbackError {
    /// リポジトリ操作エラー
    RepositoryError(String),
    /// レスポンスのシリアライズに失敗
    SerializationError(String),
}

impl From<RepositoryError> for ListFeedbackError {
    fn from(err: RepositoryError) -> Self {
        ListFeedbackError::RepositoryError(err.to_string())
    }
}

impl std::fmt::Display for ListFeedbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListFeedbackError::RepositoryError(msg) => {
                write!(f, "Failed to read feedback: {}", msg)
            }
            ListFeedbackError::SerializationError(msg) => {
                write!(f, "Failed to serialize feedback: {}", msg)
            }
        }
    }
}

impl std::error::Error for ListFeedbackError {}

/// フィードバック全件取得ハンドラー
pub struct GetAllFeedbacksHandler<R>
where
    R: FeedbackReader,
{
    reader: R,
}

impl<R> GetAllFeedbacksHandler<R>
where
    R: FeedbackReader,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// 全レコードを(ID, PostedTime)順で取得
    pub async fn handle(&self) -> Result<Vec<FeedbackRecord>, ListFeedbackError> {
        Ok(self.reader.list_all().await?)
    }

    /// 200と全レコードのJSON配列を返す
    pub async fn respond(&self) -> Response<String> {
        let result = self.handle().await.and_then(|records| {
            let count = records.len();
            serde_json::to_value(records)
                .map(|value| (count, value))
                .map_err(|e| ListFeedbackError::SerializationError(e.to_string()))
        });

        match result {
            Ok((count, value)) => {
                info!(count = count, "フィードバック一覧を返却");
                json_response(StatusCode::OK, &value)
            }
            Err(err) => {
                error!(error = %err, "フィードバック一覧の取得失敗");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}
