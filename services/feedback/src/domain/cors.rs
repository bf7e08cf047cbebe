// CORSプリフライト応答の固定ヘッダー
//
// APIはOriginを反映するロジックを持たないため、全リソースのOPTIONSに
// 同じ許可ヘッダーを静的に返してブラウザのプリフライトを通す。

/// Access-Control-Allow-Originの値（ハンドラー応答にも付与する）
pub const ALLOW_ORIGIN: &str = "*";

/// 許可するリクエストヘッダー
pub const ALLOW_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token,X-Amz-User-Agent";

/// 許可するメソッド
pub const ALLOW_METHODS: &str = "OPTIONS,GET,PUT,POST,DELETE";

/// 認証情報付きリクエストは許可しない
pub const ALLOW_CREDENTIALS: &str = "false";

/// OPTIONS応答に付与するヘッダー一覧（名前は小文字）
pub const PREFLIGHT_HEADERS: [(&str, &str); 4] = [
    ("access-control-allow-headers", ALLOW_HEADERS),
    ("access-control-allow-origin", ALLOW_ORIGIN),
    ("access-control-allow-credentials", ALLOW_CREDENTIALS),
    ("access-control-allow-methods", ALLOW_METHODS),
];
