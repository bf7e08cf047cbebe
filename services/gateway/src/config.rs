//! ゲートウェイの起動設定
//!
//! # 環境変数
//! - `DB_PATH`: SQLiteデータベースファイル（デフォルト: feedback.db）
//! - `API_ADDR`: APIのリッスンアドレス（デフォルト: 127.0.0.1:8080）
//! - `WEBSITE_ADDR`: 静的サイトのリッスンアドレス（デフォルト: 127.0.0.1:8081）
//! - `WEBSITE_DIR`: 静的サイトのバンドルディレクトリ（デフォルト: このクレートのwebsite-dist）
//! - `SENTIMENT_LANGUAGE_CODE`: 感情検出の言語コード（デフォルト: en）

use std::net::SocketAddr;
use std::path::PathBuf;

use feedback::domain::sentiment::DEFAULT_LANGUAGE_CODE;
use feedback::infrastructure::config::LANGUAGE_CODE_ENV;

use crate::error::GatewayError;

const DB_PATH_ENV: &str = "DB_PATH";
const API_ADDR_ENV: &str = "API_ADDR";
const WEBSITE_ADDR_ENV: &str = "WEBSITE_ADDR";
const WEBSITE_DIR_ENV: &str = "WEBSITE_DIR";

const DEFAULT_DB_PATH: &str = "feedback.db";
const DEFAULT_API_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_WEBSITE_ADDR: &str = "127.0.0.1:8081";
// 同梱バンドルの絶対パス
const DEFAULT_WEBSITE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/website-dist");

/// ゲートウェイ設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub db_path: String,
    pub api_addr: SocketAddr,
    pub website_addr: SocketAddr,
    pub website_dir: PathBuf,
    pub language_code: String,
}

impl GatewayConfig {
    /// 環境変数から読み込む
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から読み込む（未設定・空文字はデフォルト値）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let parse_addr = |key: &'static str, default: &str| {
            let value = value_or(key, default);
            value
                .parse::<SocketAddr>()
                .map_err(|_| GatewayError::InvalidEnvVar { name: key, value })
        };

        Ok(Self {
            db_path: value_or(DB_PATH_ENV, DEFAULT_DB_PATH),
            api_addr: parse_addr(API_ADDR_ENV, DEFAULT_API_ADDR)?,
            website_addr: parse_addr(WEBSITE_ADDR_ENV, DEFAULT_WEBSITE_ADDR)?,
            website_dir: PathBuf::from(value_or(WEBSITE_DIR_ENV, DEFAULT_WEBSITE_DIR)),
            language_code: value_or(LANGUAGE_CODE_ENV, DEFAULT_LANGUAGE_CODE),
        })
    }
}
