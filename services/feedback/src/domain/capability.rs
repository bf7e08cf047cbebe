//! ハンドラーごとの権限付与
//!
//! 各Lambda関数がフィードバックテーブルと感情検出サービスに対して
//! 行える操作を宣言し、IAMポリシードキュメントとして出力する。

use serde_json::{json, Value};

use super::api_surface::HandlerKind;

/// テーブルの読み取りに必要なアクション
pub const READ_ACTIONS: &[&str] = &[
    "dynamodb:BatchGetItem",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:Query",
    "dynamodb:GetItem",
    "dynamodb:Scan",
    "dynamodb:ConditionCheckItem",
    "dynamodb:DescribeTable",
];

/// テーブルへの書き込みに必要なアクション
pub const WRITE_ACTIONS: &[&str] = &[
    "dynamodb:BatchWriteItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
];

/// 感情検出のアクション
pub const DETECT_SENTIMENT_ACTION: &str = "comprehend:DetectSentiment";

/// テーブルへのアクセス範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAccess {
    Read,
    ReadWrite,
}

/// 1つのハンドラーに付与する権限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityGrant {
    pub handler: HandlerKind,
    pub store: StoreAccess,
    pub detect_sentiment: bool,
}

impl CapabilityGrant {
    /// ハンドラーの権限を取得
    pub fn for_handler(handler: HandlerKind) -> Self {
        match handler {
            HandlerKind::EnterFeedback => Self {
                handler,
                store: StoreAccess::ReadWrite,
                detect_sentiment: false,
            },
            HandlerKind::GetAllFeedbacks => Self {
                handler,
                store: StoreAccess::Read,
                detect_sentiment: false,
            },
            HandlerKind::PredictSentiment => Self {
                handler,
                store: StoreAccess::ReadWrite,
                detect_sentiment: true,
            },
        }
    }

    /// テーブルに対して許可されるアクション
    pub fn store_actions(&self) -> Vec<&'static str> {
        let mut actions = READ_ACTIONS.to_vec();
        if self.store == StoreAccess::ReadWrite {
            actions.extend_from_slice(WRITE_ACTIONS);
        }
        actions
    }

    /// 指定アクションが許可されているか
    pub fn permits(&self, action: &str) -> bool {
        self.store_actions().contains(&action)
            || (self.detect_sentiment && action == DETECT_SENTIMENT_ACTION)
    }

    /// IAMポリシードキュメントを生成
    ///
    /// DetectSentimentはリソース単位の制限ができないため、
    /// `aws:RequestedRegion`条件でデプロイ先リージョンに絞る。
    pub fn policy_document(&self, table_arn: &str, region: &str) -> Value {
        let mut statements = vec![json!({
            "Effect": "Allow",
            "Action": self.store_actions(),
            "Resource": [table_arn],
        })];

        if self.detect_sentiment {
            statements.push(json!({
                "Effect": "Allow",
                "Action": [DETECT_SENTIMENT_ACTION],
                "Resource": "*",
                "Condition": {
                    "StringEquals": { "aws:RequestedRegion": region }
                },
            }));
        }

        json!({
            "Version": "2012-10-17",
            "Statement": statements,
        })
    }
}
