// アプリケーション層モジュール
pub mod enter_feedback_handler;
pub mod get_all_feedbacks_handler;
pub mod http_response;
pub mod predict_sentiment_handler;

// 再エクスポート
pub use enter_feedback_handler::{EnterFeedbackHandler, SubmitFeedbackError};
pub use get_all_feedbacks_handler::{GetAllFeedbacksHandler, ListFeedbackError};
pub use http_response::{config_error_response, missing_route_response, preflight_response};
pub use predict_sentiment_handler::{PredictSentimentError, PredictSentimentHandler};
