//! SQLiteフィードバックストア
//!
//! ゲートウェイ用のFeedback Store実装。
//! - 書き込み: 専用の単一接続（Arc<Mutex<Connection>>）
//! - 読み取り: deadpool-sqliteによるasync接続プール

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deadpool_sqlite::{Config, Pool, Runtime};
use feedback::domain::{FeedbackKey, FeedbackRecord, SentimentAnalysis};
use feedback::infrastructure::{FeedbackReader, FeedbackWriter, RepositoryError};
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};
use thiserror::Error;

/// ストアエラー
#[derive(Debug, Error)]
pub enum StoreError {
    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(String),

    /// プール取得エラー
    #[error("プールエラー: {0}")]
    Pool(String),

    /// 接続構築エラー
    #[error("接続構築エラー: {0}")]
    Build(String),

    /// 属性JSONの変換エラー
    #[error("JSON変換エラー: {0}")]
    Json(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<deadpool_sqlite::BuildError> for StoreError {
    fn from(err: deadpool_sqlite::BuildError) -> Self {
        StoreError::Build(err.to_string())
    }
}

impl From<deadpool_sqlite::PoolError> for StoreError {
    fn from(err: deadpool_sqlite::PoolError) -> Self {
        StoreError::Pool(err.to_string())
    }
}

impl From<deadpool_sqlite::InteractError> for StoreError {
    fn from(err: deadpool_sqlite::InteractError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Json(err.to_string())
    }
}

/// SQLiteデータベースのスキーマ
///
/// キー以外の属性はJSON文字列として1列にまとめる。
/// TEXTのBINARY照合順序は(ID, PostedTime)のバイト順と一致する。
const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;

CREATE TABLE IF NOT EXISTS feedback (
    id TEXT NOT NULL,               -- 顧客ID
    posted_time TEXT NOT NULL,      -- 投稿時刻
    attributes_json TEXT NOT NULL,  -- キー以外の属性（JSONオブジェクト）
    PRIMARY KEY (id, posted_time)
) WITHOUT ROWID;
"#;

/// SQLiteフィードバックストア
#[derive(Clone)]
pub struct SqliteFeedbackStore {
    /// 書き込み専用接続
    write_conn: Arc<Mutex<Connection>>,
    /// 読み取り用async接続プール
    read_pool: Pool,
}

impl SqliteFeedbackStore {
    /// データベースファイルを開き、スキーマを初期化する
    pub async fn new(db_path: &str) -> Result<Self, StoreError> {
        let write_conn = Connection::open(db_path)?;
        write_conn.execute_batch(SCHEMA_SQL)?;

        let read_pool = Config::new(db_path)
            .builder(Runtime::Tokio1)
            .map_err(|e| StoreError::Build(e.to_string()))?
            .max_size(4)
            .build()?;

        Ok(Self {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
        })
    }

    /// レコードを保存（同じキーは上書き）
    pub async fn upsert(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        let key = record.key();
        let attributes_json = serde_json::to_string(&record.attributes)?;
        let conn = self.write_conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Database("書き込み接続のロック取得に失敗".to_string()))?;

            conn.execute(
                "INSERT INTO feedback (id, posted_time, attributes_json) VALUES (?1, ?2, ?3)
                 ON CONFLICT (id, posted_time) DO UPDATE SET attributes_json = excluded.attributes_json",
                rusqlite::params![&key.id, &key.posted_time, &attributes_json],
            )?;

            Ok(())
        })
        .await
        .map_err(|e| StoreError::Database(format!("タスク実行エラー: {}", e)))?
    }

    /// 既存レコードに感情分析結果を書き込む
    ///
    /// # Returns
    /// * `Ok(true)` - 更新成功
    /// * `Ok(false)` - レコードが存在しなかった
    pub async fn update_sentiment(
        &self,
        key: &FeedbackKey,
        analysis: &SentimentAnalysis,
    ) -> Result<bool, StoreError> {
        let key = key.clone();
        let analysis = *analysis;
        let conn = self.write_conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Database("書き込み接続のロック取得に失敗".to_string()))?;

            let tx = conn.unchecked_transaction()?;

            let current: Option<String> = tx
                .query_row(
                    "SELECT attributes_json FROM feedback WHERE id = ?1 AND posted_time = ?2",
                    rusqlite::params![&key.id, &key.posted_time],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(current) = current else {
                return Ok(false);
            };

            let mut record = FeedbackRecord {
                id: key.id.clone(),
                posted_time: key.posted_time.clone(),
                attributes: serde_json::from_str(&current)?,
            };
            record.apply_sentiment(&analysis);
            let attributes_json = serde_json::to_string(&record.attributes)?;

            tx.execute(
                "UPDATE feedback SET attributes_json = ?3 WHERE id = ?1 AND posted_time = ?2",
                rusqlite::params![&key.id, &key.posted_time, &attributes_json],
            )?;
            tx.commit()?;

            Ok(true)
        })
        .await
        .map_err(|e| StoreError::Database(format!("タスク実行エラー: {}", e)))?
    }

    /// レコードを(ID, PostedTime)順で取得
    ///
    /// `id`を指定した場合はそのIDのレコードのみ。
    pub async fn select(&self, id: Option<&str>) -> Result<Vec<FeedbackRecord>, StoreError> {
        let id = id.map(str::to_string);
        let conn = self.read_pool.get().await?;

        conn.interact(move |conn| Self::execute_select(conn, id.as_deref()))
            .await?
    }

    fn execute_select(
        conn: &Connection,
        id: Option<&str>,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        let (sql, params): (&str, Vec<&dyn rusqlite::ToSql>) = match &id {
            Some(id) => (
                "SELECT id, posted_time, attributes_json FROM feedback WHERE id = ?1 ORDER BY id, posted_time",
                vec![id as &dyn rusqlite::ToSql],
            ),
            None => (
                "SELECT id, posted_time, attributes_json FROM feedback ORDER BY id, posted_time",
                Vec::new(),
            ),
        };

        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, posted_time, attributes_json) = row?;
            let attributes: Map<String, Value> = serde_json::from_str(&attributes_json)?;
            records.push(FeedbackRecord {
                id,
                posted_time,
                attributes,
            });
        }

        Ok(records)
    }
}

#[async_trait]
impl FeedbackReader for SqliteFeedbackStore {
    async fn list_all(&self) -> Result<Vec<FeedbackRecord>, RepositoryError> {
        self.select(None)
            .await
            .map_err(|e| RepositoryError::ReadError(e.to_string()))
    }

    async fn list_by_id(&self, id: &str) -> Result<Vec<FeedbackRecord>, RepositoryError> {
        self.select(Some(id))
            .await
            .map_err(|e| RepositoryError::ReadError(e.to_string()))
    }
}

#[async_trait]
impl FeedbackWriter for SqliteFeedbackStore {
    async fn put(&self, record: &FeedbackRecord) -> Result<(), RepositoryError> {
        self.upsert(record)
            .await
            .map_err(|e| RepositoryError::WriteError(e.to_string()))
    }

    async fn record_sentiment(
        &self,
        key: &FeedbackKey,
        analysis: &SentimentAnalysis,
    ) -> Result<(), RepositoryError> {
        match self.update_sentiment(key, analysis).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(RepositoryError::NotFound(key.clone())),
            Err(e) => Err(RepositoryError::WriteError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback::domain::{Sentiment, SentimentScore};
    use serde_json::json;
    use tempfile::tempdir;

    /// テスト用の一時データベースパスを生成
    fn temp_db_path() -> (tempfile::TempDir, String) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        (dir, path.to_string_lossy().to_string())
    }

    #[tokio::test]
    async fn test_store_creation_creates_table() {
        let (_dir, db_path) = temp_db_path();
        let store = SqliteFeedbackStore::new(&db_path).await.unwrap();

        let conn = store.read_pool.get().await.unwrap();
        let count: i64 = conn
            .interact(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'feedback'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_store_reopen_keeps_records() {
        let (_dir, db_path) = temp_db_path();
        {
            let store = SqliteFeedbackStore::new(&db_path).await.unwrap();
            store
                .put(&FeedbackRecord::new("cust1", "t1").with_attribute("Feedback", "ok"))
                .await
                .unwrap();
        }

        let store = SqliteFeedbackStore::new(&db_path).await.unwrap();

        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_then_list_all_in_key_order() {
        let (_dir, db_path) = temp_db_path();
        let store = SqliteFeedbackStore::new(&db_path).await.unwrap();

        for (id, time) in [("cust2", "2024-01-01"), ("cust1", "2024-01-02"), ("cust1", "2024-01-01")] {
            store
                .put(&FeedbackRecord::new(id, time).with_attribute("Rating", 5))
                .await
                .unwrap();
        }

        let keys: Vec<FeedbackKey> = store
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(FeedbackRecord::key)
            .collect();
        assert_eq!(
            keys,
            vec![
                FeedbackKey::new("cust1", "2024-01-01"),
                FeedbackKey::new("cust1", "2024-01-02"),
                FeedbackKey::new("cust2", "2024-01-01"),
            ]
        );
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let (_dir, db_path) = temp_db_path();
        let store = SqliteFeedbackStore::new(&db_path).await.unwrap();

        store
            .put(&FeedbackRecord::new("c", "t").with_attribute("Feedback", "first"))
            .await
            .unwrap();
        store
            .put(&FeedbackRecord::new("c", "t").with_attribute("Feedback", "second"))
            .await
            .unwrap();

        let records = store.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].feedback_text(), Some("second"));
    }

    #[tokio::test]
    async fn test_list_by_id_filters() {
        let (_dir, db_path) = temp_db_path();
        let store = SqliteFeedbackStore::new(&db_path).await.unwrap();
        store.put(&FeedbackRecord::new("a", "1")).await.unwrap();
        store.put(&FeedbackRecord::new("b", "1")).await.unwrap();
        store.put(&FeedbackRecord::new("a", "2")).await.unwrap();

        let records = store.list_by_id("a").await.unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.id == "a"));
        assert!(store.list_by_id("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attributes_preserve_json_values() {
        let (_dir, db_path) = temp_db_path();
        let store = SqliteFeedbackStore::new(&db_path).await.unwrap();
        let record = FeedbackRecord::new("c", "t")
            .with_attribute("Tags", json!(["a", "b"]))
            .with_attribute("Meta", json!({"source": "web"}));

        store.put(&record).await.unwrap();

        assert_eq!(store.list_all().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_record_sentiment_updates_existing() {
        let (_dir, db_path) = temp_db_path();
        let store = SqliteFeedbackStore::new(&db_path).await.unwrap();
        store
            .put(&FeedbackRecord::new("c", "t").with_attribute("Feedback", "great"))
            .await
            .unwrap();
        let analysis = SentimentAnalysis::new(
            Sentiment::Positive,
            SentimentScore::new(0.5, 0.25, 0.125, 0.125),
        );

        store
            .record_sentiment(&FeedbackKey::new("c", "t"), &analysis)
            .await
            .unwrap();

        let record = &store.list_all().await.unwrap()[0];
        assert_eq!(record.sentiment(), Some("POSITIVE"));
        assert_eq!(record.attributes["SentimentScore"]["Negative"], json!(0.25));
        assert_eq!(record.feedback_text(), Some("great"));
    }

    #[tokio::test]
    async fn test_record_sentiment_missing_record() {
        let (_dir, db_path) = temp_db_path();
        let store = SqliteFeedbackStore::new(&db_path).await.unwrap();
        let key = FeedbackKey::new("nobody", "t");
        let analysis = SentimentAnalysis::new(Sentiment::Neutral, SentimentScore::default());

        let result = store.record_sentiment(&key, &analysis).await;

        assert_eq!(result, Err(RepositoryError::NotFound(key)));
    }

    #[test]
    fn test_store_error_display() {
        let error = StoreError::Pool("timeout".to_string());
        assert_eq!(error.to_string(), "プールエラー: timeout");
    }
}
