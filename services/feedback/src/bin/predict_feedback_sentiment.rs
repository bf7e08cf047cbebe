/// 感情分析Lambdaエントリポイント
///
/// API Gateway `GET /sentiment/{id}` から呼び出され、指定IDのフィードバックを
/// Amazon Comprehendで分析して結果をテーブルへ書き戻す。
///
/// # 環境変数
/// - table_name: フィードバックテーブル名（必須）
/// - SENTIMENT_LANGUAGE_CODE: 本文の言語コード（デフォルト: en）
use feedback::application::{
    config_error_response, preflight_response, PredictSentimentHandler,
};
use feedback::domain::api_surface::SENTIMENT_ID_PARAM;
use feedback::infrastructure::{
    init_logging, into_lambda_response, is_preflight, ComprehendSentimentDetector, ConfigError,
    DynamoFeedbackRepository, FeedbackConfig,
};
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use tokio::sync::OnceCell;
use tracing::info;

/// warm start時に再利用するクライアント
struct Clients {
    repository: DynamoFeedbackRepository,
    detector: ComprehendSentimentDetector,
}

static CLIENTS: OnceCell<Clients> = OnceCell::const_new();

async fn get_clients() -> Result<&'static Clients, ConfigError> {
    CLIENTS
        .get_or_try_init(|| async {
            let config = FeedbackConfig::from_env().await?;
            Ok(Clients {
                repository: DynamoFeedbackRepository::new(
                    config.dynamodb_client(),
                    config.table_name().to_string(),
                ),
                detector: ComprehendSentimentDetector::new(
                    config.comprehend_client(),
                    config.language_code(),
                ),
            })
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    info!("PredictFeedbackSentiment Lambda関数を初期化");

    run(service_fn(handler)).await
}

async fn handler(request: Request) -> Result<Response<Body>, Error> {
    if is_preflight(&request) {
        return Ok(into_lambda_response(preflight_response()));
    }

    let path_parameters = request.path_parameters();
    let id = path_parameters.first(SENTIMENT_ID_PARAM);

    let clients = match get_clients().await {
        Ok(clients) => clients,
        Err(e) => return Ok(into_lambda_response(config_error_response(&e))),
    };

    let sentiment_handler =
        PredictSentimentHandler::new(clients.repository.clone(), clients.detector.clone());
    let response = sentiment_handler.respond(id).await;

    Ok(into_lambda_response(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::Request as HttpRequest;
    use serial_test::serial;
    use std::collections::HashMap;

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    #[tokio::test]
    async fn test_preflight_answered_without_store() {
        let request = HttpRequest::builder()
            .method("OPTIONS")
            .uri("/sentiment/cust1")
            .body(Body::Empty)
            .unwrap();

        let response = handler(request).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().len(), 4);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_table_name_returns_internal_error() {
        unsafe { remove_env("table_name") };

        let request = HttpRequest::builder()
            .method("GET")
            .uri("/sentiment/cust1")
            .body(Body::Empty)
            .unwrap()
            .with_path_parameters(HashMap::from([(
                "id".to_string(),
                "cust1".to_string(),
            )]));

        let response = handler(request).await.unwrap();

        assert_eq!(response.status(), 500);
    }
}
