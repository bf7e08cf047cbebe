/// フィードバック全件取得Lambdaエントリポイント
///
/// API Gateway `GET /` から呼び出され、全レコードを返す。
/// このLambdaに付与する権限はテーブルの読み取りのみ。
use feedback::application::{
    config_error_response, preflight_response, GetAllFeedbacksHandler,
};
use feedback::infrastructure::{
    init_logging, into_lambda_response, is_preflight, ConfigError, DynamoFeedbackRepository,
    FeedbackConfig,
};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use tokio::sync::OnceCell;
use tracing::info;

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

    info!("GetAllCustomerFeedbacks Lambda関数を初期化");

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

    let response = GetAllFeedbacksHandler::new(repository.clone())
        .respond()
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

    #[tokio::test]
    async fn test_preflight_answered_without_store() {
        let request = HttpRequest::builder()
            .method("OPTIONS")
            .uri("/")
            .body(Body::Empty)
            .unwrap();

        let response = handler(request).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["access-control-allow-headers"],
            "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token,X-Amz-User-Agent"
        );
        assert_eq!(response.body(), &Body::Text(String::new()));
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_table_name_returns_internal_error() {
        unsafe { remove_env("table_name") };

        let request = HttpRequest::builder()
            .method("GET")
            .uri("/")
            .body(Body::Empty)
            .unwrap();

        let response = handler(request).await.unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
