//! Lambda関数の実行設定
//!
//! フィードバックテーブル名と感情検出の言語コードを環境変数から読み込み、
//! AWS SDKクライアントの生成元となるSdkConfigと一緒に保持する。

use aws_config::SdkConfig;
use aws_sdk_comprehend::Client as ComprehendClient;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;

use crate::domain::sentiment::DEFAULT_LANGUAGE_CODE;

/// テーブル名の環境変数
pub const TABLE_NAME_ENV: &str = "table_name";

/// 感情検出の言語コードの環境変数
pub const LANGUAGE_CODE_ENV: &str = "SENTIMENT_LANGUAGE_CODE";

/// 設定のエラー型
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// 環境変数から読み込む値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSettings {
    /// フィードバックテーブル名
    pub table_name: String,
    /// 感情検出の言語コード
    pub language_code: String,
}

impl FeedbackSettings {
    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let table_name = present(TABLE_NAME_ENV)
            .ok_or_else(|| ConfigError::MissingEnvVar(TABLE_NAME_ENV.to_string()))?;
        let language_code =
            present(LANGUAGE_CODE_ENV).unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string());

        Ok(Self {
            table_name,
            language_code,
        })
    }
}

/// AWS設定とフィードバック設定
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    /// AWS SDK共通設定（認証情報、リージョン）
    aws_config: SdkConfig,
    settings: FeedbackSettings,
}

impl FeedbackConfig {
    /// 環境変数とAWSデフォルト設定から作成
    ///
    /// 環境変数:
    /// - table_name: フィードバックテーブル名（必須）
    /// - SENTIMENT_LANGUAGE_CODE: 感情検出の言語コード（省略時は`en`）
    pub async fn from_env() -> Result<Self, ConfigError> {
        // 必須変数の欠落はAWS設定の読み込み前に検出する
        let settings = FeedbackSettings::from_lookup(|key| std::env::var(key).ok())?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        Ok(Self::new(aws_config, settings))
    }

    /// 明示的な値で作成
    pub fn new(aws_config: SdkConfig, settings: FeedbackSettings) -> Self {
        Self {
            aws_config,
            settings,
        }
    }

    /// フィードバックテーブル名を取得
    pub fn table_name(&self) -> &str {
        &self.settings.table_name
    }

    /// 感情検出の言語コードを取得
    pub fn language_code(&self) -> &str {
        &self.settings.language_code
    }

    /// DynamoDBクライアントを作成
    pub fn dynamodb_client(&self) -> DynamoDbClient {
        DynamoDbClient::new(&self.aws_config)
    }

    /// Comprehendクライアントを作成
    pub fn comprehend_client(&self) -> ComprehendClient {
        ComprehendClient::new(&self.aws_config)
    }
}
