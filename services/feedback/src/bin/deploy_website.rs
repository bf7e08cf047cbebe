/// 静的Webサイトのデプロイ
///
/// ビルド済みバンドルをS3バケットへアップロードし、インデックスドキュメント
/// `unicornfeedback.html`でWebサイトホスティングを有効化、公開読み取りポリシーを適用する。
///
/// # ローカル実行
/// ワークスペースルートで実行する（`--source`はカレントディレクトリからの相対パス）。
/// ```bash
/// cargo run --bin deploy_website -- --bucket nlp-voc-website
/// ```
use clap::Parser;
use feedback::domain::website::DEFAULT_BUNDLE_DIR;
use feedback::infrastructure::{init_logging, S3WebsiteBucket, WebsiteDeployer};
use lambda_http::Error;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "deploy_website")]
#[command(about = "静的WebサイトのバンドルをS3バケットへデプロイ")]
struct CliArgs {
    /// 配置先のS3バケット名
    #[arg(long, short = 'b')]
    bucket: String,

    /// バンドルディレクトリ（カレントディレクトリからの相対パス）
    #[arg(long, short = 's', default_value = DEFAULT_BUNDLE_DIR)]
    source: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let args = CliArgs::parse();
    info!(bucket = %args.bucket, source = %args.source.display(), "デプロイ開始");

    let bucket = S3WebsiteBucket::from_config(args.bucket.clone()).await;
    let deployer = WebsiteDeployer::new(bucket);

    match deployer.deploy(&args.source).await {
        Ok(count) => {
            info!(bucket = %args.bucket, count = count, "デプロイ成功");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "デプロイ失敗");
            Err(e.into())
        }
    }
}
