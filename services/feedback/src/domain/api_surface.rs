//! APIのルート定義
//!
//! リソースごとにメソッドとハンドラーの対応を宣言する。
//! ゲートウェイのルーター、権限ポリシーの生成、テストがこの表を参照する。

/// ルートに結び付くハンドラーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// フィードバック登録（POST /）
    EnterFeedback,
    /// フィードバック全件取得（GET /）
    GetAllFeedbacks,
    /// 感情分析（GET /sentiment/{id}）
    PredictSentiment,
}

impl HandlerKind {
    /// 全ハンドラー
    pub const ALL: [HandlerKind; 3] = [
        HandlerKind::EnterFeedback,
        HandlerKind::GetAllFeedbacks,
        HandlerKind::PredictSentiment,
    ];

    /// Lambda関数名
    pub fn function_name(&self) -> &'static str {
        match self {
            HandlerKind::EnterFeedback => "EnterCustomerFeedback",
            HandlerKind::GetAllFeedbacks => "GetAllCustomerFeedbacks",
            HandlerKind::PredictSentiment => "PredictFeedbackSentiment",
        }
    }
}

/// メソッドとハンドラーの対応
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodBinding {
    pub method: &'static str,
    pub handler: HandlerKind,
}

/// APIリソース
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiResource {
    /// パステンプレート（`{name}`はパスパラメータ）
    pub path: &'static str,
    /// OPTIONS以外のメソッド
    pub bindings: &'static [MethodBinding],
}

impl ApiResource {
    /// パスパラメータをサンプル値で埋めた具体的なパス
    pub fn sample_path(&self, sample: &str) -> String {
        let mut path = String::with_capacity(self.path.len());
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            path.push_str(&rest[..start]);
            match rest[start..].find('}') {
                Some(end) => {
                    path.push_str(sample);
                    rest = &rest[start + end + 1..];
                }
                None => {
                    rest = &rest[start..];
                    break;
                }
            }
        }
        path.push_str(rest);
        path
    }
}

/// 宣言済みの全リソース
///
/// すべてのリソースは暗黙にOPTIONS（CORSプリフライト）を受け付ける。
pub const API_RESOURCES: &[ApiResource] = &[
    ApiResource {
        path: "/",
        bindings: &[
            MethodBinding {
                method: "GET",
                handler: HandlerKind::GetAllFeedbacks,
            },
            MethodBinding {
                method: "POST",
                handler: HandlerKind::EnterFeedback,
            },
        ],
    },
    ApiResource {
        path: "/sentiment/{id}",
        bindings: &[MethodBinding {
            method: "GET",
            handler: HandlerKind::PredictSentiment,
        }],
    },
];

/// パスパラメータ名（感情分析対象の顧客ID）
pub const SENTIMENT_ID_PARAM: &str = "id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_handler_is_bound_exactly_once() {
        for handler in HandlerKind::ALL {
            let count = API_RESOURCES
                .iter()
                .flat_map(|r| r.bindings.iter())
                .filter(|b| b.handler == handler)
                .count();
            assert_eq!(count, 1, "{:?} は1つのルートにのみ結び付くべき", handler);
        }
    }

    #[test]
    fn test_root_bindings() {
        let root = &API_RESOURCES[0];
        let bindings: Vec<_> = root.bindings.iter().map(|b| (b.method, b.handler)).collect();
        assert_eq!(
            bindings,
            vec![
                ("GET", HandlerKind::GetAllFeedbacks),
                ("POST", HandlerKind::EnterFeedback),
            ]
        );
    }

    #[test]
    fn test_sample_path_replaces_parameter() {
        assert_eq!(API_RESOURCES[1].sample_path("cust1"), "/sentiment/cust1");
        assert_eq!(API_RESOURCES[0].sample_path("cust1"), "/");
    }

    #[test]
    fn test_function_names() {
        assert_eq!(HandlerKind::EnterFeedback.function_name(), "EnterCustomerFeedback");
        assert_eq!(HandlerKind::GetAllFeedbacks.function_name(), "GetAllCustomerFeedbacks");
        assert_eq!(
            HandlerKind::PredictSentiment.function_name(),
            "PredictFeedbackSentiment"
        );
    }
}
