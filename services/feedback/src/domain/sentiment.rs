//! 感情分析の結果型
//!
//! ラベル・スコアの語彙は感情検出サービス（Amazon Comprehend）の
//! DetectSentiment応答に合わせる。

use serde::{Deserialize, Serialize};

/// 感情検出サービスが受け付ける本文の最大バイト数（UTF-8）
pub const MAX_TEXT_BYTES: usize = 5000;

/// デフォルトの言語コード
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// 感情ラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl Sentiment {
    /// 属性値として保存する文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
            Sentiment::Neutral => "NEUTRAL",
            Sentiment::Mixed => "MIXED",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ラベルごとの確信度
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SentimentScore {
    pub positive: f32,
    pub negative: f32,
    pub neutral: f32,
    pub mixed: f32,
}

impl SentimentScore {
    pub fn new(positive: f32, negative: f32, neutral: f32, mixed: f32) -> Self {
        Self {
            positive,
            negative,
            neutral,
            mixed,
        }
    }
}

/// 1件の本文に対する感情分析結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub score: SentimentScore,
}

impl SentimentAnalysis {
    pub fn new(sentiment: Sentiment, score: SentimentScore) -> Self {
        Self { sentiment, score }
    }
}

/// 本文を最大バイト数以内に切り詰める
///
/// 文字境界を跨がない位置で切る。
pub fn truncate_text(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }

    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
