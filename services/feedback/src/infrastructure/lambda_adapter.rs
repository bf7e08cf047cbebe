// API Gateway（RESTプロキシ統合）とハンドラーの橋渡し
//
// ハンドラーはhttp::Response<String>を返し、Lambda用のBodyへの変換はここで行う。

use lambda_http::http::{Method, Response};
use lambda_http::{Body, Request};

/// ハンドラーのレスポンスをLambda用に変換
pub fn into_lambda_response(response: Response<String>) -> Response<Body> {
    response.map(Body::Text)
}

/// リクエストボディをバイト列のまま取得（空ならNone）
///
/// 文字コードの検証は投稿ボディの解釈時に行う。
pub fn request_body(request: &Request) -> Option<&[u8]> {
    match request.body() {
        Body::Text(text) => Some(text.as_bytes()),
        Body::Binary(bytes) => Some(bytes.as_slice()),
        _ => None,
    }
}

/// CORSプリフライトかどうか
pub fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
}
