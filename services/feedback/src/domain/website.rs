//! 静的Webサイトの配信ルール
//!
//! インデックスドキュメント名、拡張子ごとのContent-Type、
//! 公開読み取り用のバケットポリシーを定義する。

use serde_json::{json, Value};

/// インデックスドキュメント名
pub const INDEX_DOCUMENT: &str = "unicornfeedback.html";

/// デフォルトのバンドルディレクトリ（ワークスペースルートからの相対パス）
pub const DEFAULT_BUNDLE_DIR: &str = "services/gateway/website-dist";

/// 拡張子からContent-Typeを決定する
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// 公開読み取り用バケットポリシー
pub fn public_read_policy(bucket: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicReadGetObject",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{}/*", bucket)],
        }],
    })
}
