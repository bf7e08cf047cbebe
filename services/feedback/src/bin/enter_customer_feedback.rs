/// フィードバック登録Lambdaエントリポイント
///
/// API Gateway `POST /` から呼び出され、ボディを1件のレコードとして保存する。
///
/// # 環境変数
/// - table_name: フィードバックテーブル名（必須）
use chrono::Utc;
use feedback::application::{config_error_response, preflight_response, EnterFeedbackHandler};
use feedback::infrastructure::{
    init_logging, into_lambda_response, is_preflight, request_body, ConfigError,
    DynamoFeedbackRepository, FeedbackConfig,
};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use tokio::sync::OnceCell;
use tracing::info;

/// warm start時に再利用するリポジトリ
static REPOSITORY: OnceCell<DynamoFeedbackRepository> = OnceCell::const_new();

async fn get_repository() -> Result<&'static DynamoFeedbackRepository, ConfigError> {
    REPOSITORY
        .get_or_try_init(|| async {
            let config = FeedbackConfig::from_env().await?;
            Ok(DynamoFeedbackRepository::new(
                config.dynamodb_client(),
                config.table_name().to_string(),
            ))
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    info!("EnterCustomerFeedback Lambda関数を初期化");

    run(service_fn(handler)).await
}

async fn handler(request: Request) -> Result<Response<Body>, Error> {
    if is_preflight(&request) {
        return Ok(into_lambda_response(preflight_response()));
    }

    let repository = match get_repository().await {
        Ok(repository) => repository,
        Err(e) => return Ok(into_lambda_response(config_error_response(&e))),
    };

    let feedback_handler = EnterFeedbackHandler::new(repository.clone());
    let response = feedback_handler
        .respond(request_body(&request), Utc::now())
        .await;

    Ok(into_lambda_response(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::Request as HttpRequest;
    use serial_test::serial;

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn body_text(response: &Response<Body>) -> String {
        match response.body() {
            Body::Text(text) => text.clone(),
            Body::Binary(bytes) => String::from_utf8(bytes.clone()).unwrap(),
            Body::Empty => String::new(),
            _ => panic!("予期しないBody型"),
        }
    }

    #[tokio::test]
    async fn test_preflight_answered_without_store() {
        let request = HttpRequest::builder()
            .method("OPTIONS")
            .uri("/")
            .body(Body::Empty)
            .unwrap();

        let response = handler(request).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().len(), 4);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_table_name_returns_internal_error() {
        unsafe { remove_env("table_name") };

        let request = HttpRequest::builder()
            .method("POST")
            .uri("/")
            .body(Body::Text(r#"{"Feedback":"great product"}"#.to_string()))
            .unwrap();

        let response = handler(request).await.unwrap();

        assert_eq!(response.status(), 500);
        assert!(body_text(&response).contains("table_name"));
    }
}
