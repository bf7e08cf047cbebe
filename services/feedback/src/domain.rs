// ドメイン層モジュール
pub mod api_surface;
pub mod capability;
pub mod cors;
pub mod feedback_record;
pub mod sentiment;
pub mod website;

// 再エクスポート
pub use api_surface::{ApiResource, HandlerKind, MethodBinding, API_RESOURCES};
pub use capability::{CapabilityGrant, StoreAccess};
pub use cors::{ALLOW_ORIGIN, PREFLIGHT_HEADERS};
pub use feedback_record::{FeedbackKey, FeedbackRecord, SubmissionError};
pub use sentiment::{Sentiment, SentimentAnalysis, SentimentScore};
