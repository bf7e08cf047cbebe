/// ログ基盤モジュール
///
/// Lambda環境（CloudWatch Logs）向けにJSON形式の構造化ログを設定する。
use std::sync::Once;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static INIT: Once = Once::new();

/// ログサブスクライバーを初期化する
///
/// `RUST_LOG`でレベルを指定できる（未指定ならinfo）。
/// 複数回呼び出しても最初の1回だけ初期化する。
pub fn init_logging() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // 他で初期化済みの場合は無視する
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer(std::io::stdout))
            .try_init();
    });
}

/// JSON出力レイヤー
///
/// イベントのフィールドはトップレベルに展開する。
fn json_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .flatten_event(true)
        .with_current_span(false)
        .with_writer(make_writer)
}
