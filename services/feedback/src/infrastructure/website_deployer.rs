//! 静的Webサイトのデプロイ
//!
//! ビルド済みバンドルをS3バケットへアップロードし、
//! Webサイトホスティングと公開読み取りポリシーを設定する。

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{IndexDocument, WebsiteConfiguration};
use aws_sdk_s3::Client as S3Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::website::{content_type_for, public_read_policy, INDEX_DOCUMENT};

/// デプロイのエラー型
#[derive(Debug, Error)]
pub enum DeployError {
    /// バンドルの読み込みに失敗
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// バンドルにインデックスドキュメントが無い
    #[error("Index document not found in {}", .0.display())]
    MissingIndexDocument(PathBuf),

    /// AWS SDK エラー
    #[error("AWS S3 APIエラー: {0}")]
    AwsSdkError(String),
}

/// アップロード対象の1ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteAsset {
    /// オブジェクトキー（`/`区切りの相対パス）
    pub key: String,
    /// ローカルファイルのパス
    pub path: PathBuf,
    pub content_type: &'static str,
}

/// バンドルディレクトリ配下の全ファイルを列挙する
///
/// 結果はキー順。インデックスドキュメントが無ければエラー。
/// ディレクトリへのシンボリックリンクは辿らない。
pub fn collect_assets(root: &Path) -> Result<Vec<WebsiteAsset>, DeployError> {
    let mut assets = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if file_type.is_symlink() && path.is_dir() {
                warn!(path = %path.display(), "ディレクトリへのシンボリックリンクをスキップ");
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let content_type = content_type_for(&key);

            assets.push(WebsiteAsset {
                key,
                path,
                content_type,
            });
        }
    }

    if !assets.iter().any(|a| a.key == INDEX_DOCUMENT) {
        return Err(DeployError::MissingIndexDocument(root.to_path_buf()));
    }

    assets.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(assets)
}

/// Webサイト用バケット操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait WebsiteBucket: Send + Sync {
    /// オブジェクトをアップロード
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), DeployError>;

    /// Webサイトホスティングを有効化
    async fn configure_website(&self, index_document: &str) -> Result<(), DeployError>;

    /// パブリックアクセスブロックを解除してバケットポリシーを適用
    async fn apply_public_policy(&self, policy: &str) -> Result<(), DeployError>;

    /// バケット名
    fn bucket_name(&self) -> &str;
}

/// AWS S3 SDKを使用したバケット操作実装
#[derive(Debug, Clone)]
pub struct S3WebsiteBucket {
    client: S3Client,
    bucket: String,
}

impl S3WebsiteBucket {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// AWS設定からデフォルトのクライアントを作成
    pub async fn from_config(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(S3Client::new(&config), bucket)
    }
}

#[async_trait]
impl WebsiteBucket for S3WebsiteBucket {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), DeployError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| DeployError::AwsSdkError(e.into_service_error().to_string()))?;
        Ok(())
    }

    async fn configure_website(&self, index_document: &str) -> Result<(), DeployError> {
        let index = IndexDocument::builder()
            .suffix(index_document)
            .build()
            .map_err(|e| DeployError::AwsSdkError(e.to_string()))?;
        let website = WebsiteConfiguration::builder().index_document(index).build();

        self.client
            .put_bucket_website()
            .bucket(&self.bucket)
            .website_configuration(website)
            .send()
            .await
            .map_err(|e| DeployError::AwsSdkError(e.into_service_error().to_string()))?;
        Ok(())
    }

    async fn apply_public_policy(&self, policy: &str) -> Result<(), DeployError> {
        // 新規バケットはパブリックポリシーをブロックしているため先に解除する
        self.client
            .delete_public_access_block()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| DeployError::AwsSdkError(e.into_service_error().to_string()))?;

        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| DeployError::AwsSdkError(e.into_service_error().to_string()))?;
        Ok(())
    }

    fn bucket_name(&self) -> &str {
        &self.bucket
    }
}

/// バンドルをバケットへ配置する
pub struct WebsiteDeployer<B> {
    bucket: B,
}

impl<B: WebsiteBucket> WebsiteDeployer<B> {
    pub fn new(bucket: B) -> Self {
        Self { bucket }
    }

    /// バンドルをアップロードし、Webサイト設定とポリシーを適用する
    ///
    /// アップロードしたファイル数を返す。
    pub async fn deploy(&self, source: &Path) -> Result<usize, DeployError> {
        let assets = collect_assets(source)?;

        for asset in &assets {
            let body = tokio::fs::read(&asset.path).await?;
            self.bucket
                .put_object(&asset.key, asset.content_type, body)
                .await?;
            info!(key = %asset.key, content_type = asset.content_type, "アップロード完了");
        }

        self.bucket.configure_website(INDEX_DOCUMENT).await?;

        let policy = public_read_policy(self.bucket.bucket_name()).to_string();
        self.bucket.apply_public_policy(&policy).await?;

        info!(
            bucket = self.bucket.bucket_name(),
            count = assets.len(),
            "Webサイトのデプロイ完了"
        );
        Ok(assets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    fn sample_bundle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "unicornfeedback.html", "<html></html>");
        write_file(dir.path(), "css/site.css", "body {}");
        write_file(dir.path(), "js/app.js", "console.log('hi')");
        dir
    }

    // ==================== バンドル列挙 ====================

    #[test]
    fn test_collect_assets_walks_subdirectories() {
        let bundle = sample_bundle();

        let assets = collect_assets(bundle.path()).unwrap();

        let keys: Vec<&str> = assets.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["css/site.css", "js/app.js", "unicornfeedback.html"]);
        assert_eq!(assets[2].content_type, "text/html; charset=utf-8");
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_assets_skips_directory_symlink_cycle() {
        let dir = sample_bundle();
        // css/loop -> バンドルルート（循環）
        std::os::unix::fs::symlink(dir.path(), dir.path().join("css/loop")).unwrap();

        let assets = collect_assets(dir.path()).unwrap();

        let keys: Vec<_> = assets.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["css/site.css", "js/app.js", "unicornfeedback.html"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_assets_keeps_file_symlinks() {
        let dir = sample_bundle();
        std::os::unix::fs::symlink(
            dir.path().join("css/site.css"),
            dir.path().join("css/alias.css"),
        )
        .unwrap();

        let assets = collect_assets(dir.path()).unwrap();

        assert!(assets.iter().any(|a| a.key == "css/alias.css"));
        assert_eq!(assets.len(), 4);
    }

    #[test]
    fn test_collect_assets_requires_index_document() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "other.html", "<html></html>");

        let result = collect_assets(dir.path());

        assert!(matches!(result, Err(DeployError::MissingIndexDocument(_))));
    }

    #[test]
    fn test_collect_assets_missing_directory() {
        let dir = tempfile::tempdir().unwrap();

        let result = collect_assets(&dir.path().join("nope"));

        assert!(matches!(result, Err(DeployError::Io(_))));
    }

    // ==================== モックバケット ====================

    #[derive(Debug, Clone, Default)]
    struct MockWebsiteBucket {
        /// 呼び出された操作の記録
        operations: Arc<Mutex<Vec<String>>>,
        fail_put: bool,
    }

    #[async_trait]
    impl WebsiteBucket for MockWebsiteBucket {
        async fn put_object(
            &self,
            key: &str,
            content_type: &str,
            body: Vec<u8>,
        ) -> Result<(), DeployError> {
            if self.fail_put {
                return Err(DeployError::AwsSdkError("AccessDenied".to_string()));
            }
            self.operations
                .lock()
                .unwrap()
                .push(format!("put {} {} {}", key, content_type, body.len()));
            Ok(())
        }

        async fn configure_website(&self, index_document: &str) -> Result<(), DeployError> {
            self.operations
                .lock()
                .unwrap()
                .push(format!("website {}", index_document));
            Ok(())
        }

        async fn apply_public_policy(&self, policy: &str) -> Result<(), DeployError> {
            let value: serde_json::Value = serde_json::from_str(policy).unwrap();
            self.operations.lock().unwrap().push(format!(
                "policy {}",
                value["Statement"][0]["Resource"][0].as_str().unwrap()
            ));
            Ok(())
        }

        fn bucket_name(&self) -> &str {
            "nlp-voc-website"
        }
    }

    #[tokio::test]
    async fn test_deploy_uploads_then_configures() {
        let bundle = sample_bundle();
        let bucket = MockWebsiteBucket::default();
        let deployer = WebsiteDeployer::new(bucket.clone());

        let uploaded = deployer.deploy(bundle.path()).await.unwrap();

        assert_eq!(uploaded, 3);
        let operations = bucket.operations.lock().unwrap().clone();
        assert_eq!(
            operations,
            vec![
                "put css/site.css text/css; charset=utf-8 7".to_string(),
                "put js/app.js application/javascript 17".to_string(),
                "put unicornfeedback.html text/html; charset=utf-8 13".to_string(),
                "website unicornfeedback.html".to_string(),
                "policy arn:aws:s3:::nlp-voc-website/*".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_deploy_stops_on_upload_failure() {
        let bundle = sample_bundle();
        let bucket = MockWebsiteBucket {
            fail_put: true,
            ..Default::default()
        };
        let deployer = WebsiteDeployer::new(bucket.clone());

        let result = deployer.deploy(bundle.path()).await;

        assert!(matches!(result, Err(DeployError::AwsSdkError(_))));
        assert!(bucket.operations.lock().unwrap().is_empty());
    }
}
