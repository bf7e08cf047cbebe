//! HTTPレスポンスの組み立て
//!
//! LambdaとゲートウェイのどちらからもHTTPレスポンスとして返せるよう、
//! ボディはStringで持つ。

use lambda_http::http::header::{
    HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use lambda_http::http::{Response, StatusCode};
use serde_json::{json, Value};

use crate::domain::{ALLOW_ORIGIN, PREFLIGHT_HEADERS};
use crate::infrastructure::ConfigError;

/// JSONレスポンス（Access-Control-Allow-Origin付き）
pub fn json_response(status: StatusCode, body: &Value) -> Response<String> {
    let mut response = Response::new(body.to_string());
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    response
}

/// エラーレスポンス `{"message": ...}`
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response<String> {
    json_response(status, &json!({ "message": message.into() }))
}

/// 設定の読み込み失敗を500で返す
pub fn config_error_response(error: &ConfigError) -> Response<String> {
    tracing::error!(error = %error, "設定の読み込みに失敗");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

/// CORSプリフライト応答
///
/// ハンドラーを呼ばずに200と固定のCORSヘッダー4つだけを返す。
pub fn preflight_response() -> Response<String> {
    let mut response = Response::new(String::new());
    let headers = response.headers_mut();
    for (name, value) in PREFLIGHT_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}

/// 未定義のリソース・メソッドへの応答
///
/// API Gatewayのデフォルト応答に合わせて403を返す。
pub fn missing_route_response() -> Response<String> {
    let mut response = Response::new(json!({ "message": "Missing Authentication Token" }).to_string());
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response_has_origin_header() {
        let response = json_response(StatusCode::OK, &json!([]));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.body(), "[]");
    }

    #[test]
    fn test_error_response_body() {
        let response = error_response(StatusCode::BAD_REQUEST, "Request body is missing");

        let body: Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": "Request body is missing"}));
    }

    #[test]
    fn test_config_error_response() {
        let error = ConfigError::MissingEnvVar("table_name".to_string());

        let response = config_error_response(&error);

        let body: Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            body,
            json!({"message": "Missing environment variable: table_name"})
        );
    }

    #[test]
    fn test_preflight_response_has_exactly_cors_headers() {
        let response = preflight_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().len(), 4);
        assert_eq!(
            response.headers()["access-control-allow-methods"],
            "OPTIONS,GET,PUT,POST,DELETE"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "false");
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_missing_route_response() {
        let response = missing_route_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body(), r#"{"message":"Missing Authentication Token"}"#);
    }
}
