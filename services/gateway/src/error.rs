//! 起動時のエラー
//!
//! リクエスト単位のエラーはフィードバックハンドラーがJSONレスポンスに変換するため、
//! ここではサーバー起動・停止に関わるエラーのみを扱う。

use thiserror::Error;

use crate::store::StoreError;

/// ゲートウェイのエラー型
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 環境変数の値が不正
    #[error("環境変数 {name} の値が不正です: {value}")]
    InvalidEnvVar { name: &'static str, value: String },

    /// ストアの初期化に失敗
    #[error("SQLiteストアの初期化に失敗しました: {0}")]
    Store(#[from] StoreError),

    /// リッスン・サーバー実行エラー
    #[error("サーバーエラー: {0}")]
    Io(#[from] std::io::Error),
}
