//! フィードバックAPIのセルフホスト用HTTPサーバー
//!
//! 本バイナリは以下の機能を提供する:
//! - フィードバック全件取得 (GET /)
//! - フィードバック登録 (POST /)
//! - 感情分析 (GET /sentiment/{id})
//! - 全リソースのCORSプリフライト (OPTIONS)
//! - 静的Webサイトの配信（別リスナー）

mod config;
mod error;
mod store;

use config::GatewayConfig;
use error::GatewayError;
use store::SqliteFeedbackStore;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{options, MethodFilter, MethodRouter},
    Router,
};
use chrono::Utc;
use feedback::application::{
    missing_route_response, preflight_response, EnterFeedbackHandler, GetAllFeedbacksHandler,
    PredictSentimentHandler,
};
use feedback::domain::website::INDEX_DOCUMENT;
use feedback::domain::{HandlerKind, API_RESOURCES};
use feedback::infrastructure::{ComprehendSentimentDetector, SentimentDetector};
use std::future::IntoFuture;
use std::path::Path as FsPath;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// SQLiteフィードバックストア
    pub store: SqliteFeedbackStore,
    /// 感情検出
    pub detector: Arc<dyn SentimentDetector>,
}

/// フィードバック全件取得 (GET /)
async fn get_all_feedbacks(State(state): State<AppState>) -> Response {
    GetAllFeedbacksHandler::new(state.store.clone())
        .respond()
        .await
        .into_response()
}

/// フィードバック登録 (POST /)
///
/// ボディの文字コード・形はハンドラーが検証する。
async fn enter_feedback(State(state): State<AppState>, body: Bytes) -> Response {
    EnterFeedbackHandler::new(state.store.clone())
        .respond(Some(body.as_ref()), Utc::now())
        .await
        .into_response()
}

/// 感情分析 (GET /sentiment/{id})
async fn predict_sentiment(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    tracing::info!(id = %id, "感情分析リクエストを受信");

    PredictSentimentHandler::new(state.store.clone(), state.detector.clone())
        .respond(Some(&id))
        .await
        .into_response()
}

/// CORSプリフライト（ハンドラーを呼ばない）
async fn preflight() -> Response {
    preflight_response().into_response()
}

/// 未定義のリソース・メソッド
async fn missing_route() -> Response {
    missing_route_response().into_response()
}

/// ルート表のメソッド名をaxumのMethodFilterに変換
fn method_filter(method: &str) -> Option<MethodFilter> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Some(MethodFilter::GET),
        "POST" => Some(MethodFilter::POST),
        "PUT" => Some(MethodFilter::PUT),
        "DELETE" => Some(MethodFilter::DELETE),
        "PATCH" => Some(MethodFilter::PATCH),
        _ => None,
    }
}

/// ハンドラー種別に対応するaxumハンドラーを登録
fn bind_handler(
    route: MethodRouter<AppState>,
    filter: MethodFilter,
    handler: HandlerKind,
) -> MethodRouter<AppState> {
    match handler {
        HandlerKind::EnterFeedback => route.on(filter, enter_feedback),
        HandlerKind::GetAllFeedbacks => route.on(filter, get_all_feedbacks),
        HandlerKind::PredictSentiment => route.on(filter, predict_sentiment),
    }
}

/// APIルーターを構築する
///
/// `API_RESOURCES`の各リソースにOPTIONSと宣言済みメソッドを登録する。
/// 未定義のパス・メソッドはAPI Gatewayと同じ403を返す。
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new();

    for resource in API_RESOURCES {
        let mut route = options(preflight).fallback(missing_route);
        for binding in resource.bindings {
            match method_filter(binding.method) {
                Some(filter) => route = bind_handler(route, filter, binding.handler),
                None => tracing::warn!(
                    path = resource.path,
                    method = binding.method,
                    "未対応のメソッドのためルートを登録しません"
                ),
            }
        }
        router = router.route(resource.path, route);
    }

    router
        .fallback(missing_route)
        // リクエストトレーシングレイヤー（method, path, status, latencyを自動記録）
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 静的Webサイトのルーターを構築する
///
/// `/`はインデックスドキュメント、それ以外はディレクトリから配信する。
pub fn website_router(website_dir: &FsPath) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(website_dir.join(INDEX_DOCUMENT)))
        .fallback_service(ServeDir::new(website_dir))
        .layer(TraceLayer::new_for_http())
}

/// シャットダウンシグナルを待機する
///
/// SIGTERMまたはCtrl+C (SIGINT) を受信したらリターンする。
/// シグナルハンドラーを登録できなかった場合はそのシグナルを待たない。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C シグナルハンドラーの登録に失敗しました");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM シグナルハンドラーの登録に失敗しました");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            tracing::info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}

/// 停止通知を待つ（2つのサーバーで共有）
async fn wait_for_shutdown(mut receiver: watch::Receiver<bool>) {
    let _ = receiver.wait_for(|stopping| *stopping).await;
}

/// メイン関数
///
/// APIサーバーと静的サイトサーバーを起動し、シグナル受信で両方をgraceful shutdownする。
/// `RUST_LOG`でログレベルを制御する（デフォルト: info）。
#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("フィードバックゲートウェイを起動します");

    let config = GatewayConfig::from_env()?;
    tracing::info!(db_path = %config.db_path, "データベースパス");

    let store = SqliteFeedbackStore::new(&config.db_path).await?;
    tracing::info!("SQLiteストアを初期化しました");

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let detector = ComprehendSentimentDetector::from_config(&aws_config, config.language_code.clone());

    let state = AppState {
        store,
        detector: Arc::new(detector),
    };
    let api_app = create_router(state);
    let website_app = website_router(&config.website_dir);

    let api_listener = tokio::net::TcpListener::bind(config.api_addr).await?;
    let website_listener = tokio::net::TcpListener::bind(config.website_addr).await?;
    tracing::info!(
        api_addr = %config.api_addr,
        website_addr = %config.website_addr,
        website_dir = %config.website_dir.display(),
        "リッスン開始"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let api_server = axum::serve(api_listener, api_app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()))
        .into_future();
    let website_server = axum::serve(website_listener, website_app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .into_future();

    tokio::try_join!(api_server, website_server)?;

    tracing::info!("サーバーが正常に停止しました");
    Ok(())
}
