//! 感情検出モジュール
//!
//! Amazon ComprehendのDetectSentimentを呼び出し、結果をドメインの
//! SentimentAnalysisに変換する。

use async_trait::async_trait;
use aws_sdk_comprehend::operation::detect_sentiment::builders::DetectSentimentFluentBuilder;
use aws_sdk_comprehend::operation::detect_sentiment::DetectSentimentOutput;
use aws_sdk_comprehend::types::{LanguageCode, SentimentType};
use aws_sdk_comprehend::Client as ComprehendClient;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::sentiment::{truncate_text, MAX_TEXT_BYTES};
use crate::domain::{Sentiment, SentimentAnalysis, SentimentScore};

/// 感情検出のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    /// AWS SDK エラー
    #[error("AWS Comprehend APIエラー: {0}")]
    AwsSdkError(String),
    /// 応答に期待した値が無い
    #[error("不正な応答: {0}")]
    UnexpectedResponse(String),
}

/// 感情検出トレイト（テスト用の抽象化）
#[async_trait]
pub trait SentimentDetector: Send + Sync {
    /// 本文の感情を判定する
    async fn detect(&self, text: &str) -> Result<SentimentAnalysis, DetectorError>;
}

#[async_trait]
impl<D> SentimentDetector for Arc<D>
where
    D: SentimentDetector + ?Sized,
{
    async fn detect(&self, text: &str) -> Result<SentimentAnalysis, DetectorError> {
        (**self).detect(text).await
    }
}

/// Amazon Comprehendを使用した感情検出実装
#[derive(Debug, Clone)]
pub struct ComprehendSentimentDetector {
    client: ComprehendClient,
    /// 本文の言語コード
    language_code: String,
}

impl ComprehendSentimentDetector {
    pub fn new(client: ComprehendClient, language_code: impl Into<String>) -> Self {
        Self {
            client,
            language_code: language_code.into(),
        }
    }

    /// AWS設定から作成
    pub fn from_config(config: &aws_config::SdkConfig, language_code: impl Into<String>) -> Self {
        Self::new(ComprehendClient::new(config), language_code)
    }

    /// DetectSentimentリクエストを組み立てる
    ///
    /// 本文はComprehendの上限バイト数に収まるよう文字境界で切り詰める。
    fn sentiment_request(&self, text: &str) -> DetectSentimentFluentBuilder {
        self.client
            .detect_sentiment()
            .text(truncate_text(text, MAX_TEXT_BYTES))
            .language_code(LanguageCode::from(self.language_code.as_str()))
    }
}

/// ComprehendのSentimentTypeをドメインのラベルに変換
fn to_sentiment(sentiment_type: &SentimentType) -> Result<Sentiment, DetectorError> {
    match sentiment_type {
        SentimentType::Positive => Ok(Sentiment::Positive),
        SentimentType::Negative => Ok(Sentiment::Negative),
        SentimentType::Neutral => Ok(Sentiment::Neutral),
        SentimentType::Mixed => Ok(Sentiment::Mixed),
        other => Err(DetectorError::UnexpectedResponse(format!(
            "未知の感情ラベル: {}",
            other.as_str()
        ))),
    }
}

/// DetectSentimentの応答をドメインの分析結果に変換
///
/// スコアが欠けている場合は0として扱う。
fn analysis_from_output(output: &DetectSentimentOutput) -> Result<SentimentAnalysis, DetectorError> {
    let sentiment = output
        .sentiment()
        .ok_or_else(|| DetectorError::UnexpectedResponse("Sentimentがありません".to_string()))
        .and_then(to_sentiment)?;

    let score = output
        .sentiment_score()
        .map(|s| {
            SentimentScore::new(
                s.positive().unwrap_or_default(),
                s.negative().unwrap_or_default(),
                s.neutral().unwrap_or_default(),
                s.mixed().unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    Ok(SentimentAnalysis::new(sentiment, score))
}

#[async_trait]
impl SentimentDetector for ComprehendSentimentDetector {
    async fn detect(&self, text: &str) -> Result<SentimentAnalysis, DetectorError> {
        let output = self
            .sentiment_request(text)
            .send()
            .await
            .map_err(|e| DetectorError::AwsSdkError(e.into_service_error().to_string()))?;

        let analysis = analysis_from_output(&output)?;

        debug!(sentiment = %analysis.sentiment, "感情検出完了");
        Ok(analysis)
    }
}
