// インフラストラクチャ層 - AWS SDKアダプター、設定、ログ
pub mod config;
pub mod feedback_repository;
pub mod lambda_adapter;
pub mod logging;
pub mod sentiment_detector;
pub mod website_deployer;

pub use config::{ConfigError, FeedbackConfig, FeedbackSettings};
pub use feedback_repository::{
    DynamoFeedbackRepository, FeedbackReader, FeedbackWriter, RepositoryError,
};
pub use lambda_adapter::{into_lambda_response, is_preflight, request_body};
pub use logging::init_logging;
pub use sentiment_detector::{ComprehendSentimentDetector, DetectorError, SentimentDetector};
pub use website_deployer::{
    collect_assets, DeployError, S3WebsiteBucket, WebsiteAsset, WebsiteBucket, WebsiteDeployer,
};
