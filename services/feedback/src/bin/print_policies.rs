/// ハンドラーごとのIAMポリシー出力
///
/// 各Lambda関数に付与する権限をIAMポリシードキュメント（JSON）として標準出力へ書き出す。
///
/// # ローカル実行
/// ```bash
/// cargo run --bin print_policies -- \
///   --table-arn arn:aws:dynamodb:us-east-1:123456789012:table/UnicornCustomerFeedback \
///   --region us-east-1
/// ```
use clap::Parser;
use feedback::domain::{CapabilityGrant, HandlerKind, API_RESOURCES};
use lambda_http::Error;
use serde_json::{json, Map, Value};

#[derive(Parser, Debug)]
#[command(name = "print_policies")]
#[command(about = "各ハンドラーのIAMポリシードキュメントを出力")]
struct CliArgs {
    /// フィードバックテーブルのARN
    #[arg(long)]
    table_arn: String,

    /// デプロイ先リージョン（感情検出の許可をこのリージョンに限定する）
    #[arg(long)]
    region: String,
}

/// ハンドラーが結び付くルート（例: `GET /sentiment/{id}`）
fn route_of(handler: HandlerKind) -> Vec<String> {
    API_RESOURCES
        .iter()
        .flat_map(|resource| {
            resource
                .bindings
                .iter()
                .filter(move |b| b.handler == handler)
                .map(move |b| format!("{} {}", b.method, resource.path))
        })
        .collect()
}

/// 関数名をキーにした全ハンドラーのポリシー
fn build_policies(table_arn: &str, region: &str) -> Value {
    let mut policies = Map::new();
    for handler in HandlerKind::ALL {
        let grant = CapabilityGrant::for_handler(handler);
        policies.insert(
            handler.function_name().to_string(),
            json!({
                "Routes": route_of(handler),
                "Policy": grant.policy_document(table_arn, region),
            }),
        );
    }
    Value::Object(policies)
}

fn main() -> Result<(), Error> {
    let args = CliArgs::parse();

    let policies = build_policies(&args.table_arn, &args.region);
    println!("{}", serde_json::to_string_pretty(&policies)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback::domain::capability::WRITE_ACTIONS;

    const TABLE_ARN: &str = "arn:aws:dynamodb:us-east-1:123456789012:table/UnicornCustomerFeedback";

    #[test]
    fn test_build_policies_has_every_function() {
        let policies = build_policies(TABLE_ARN, "us-east-1");

        let names: Vec<&String> = policies.as_object().unwrap().keys().collect();
        assert_eq!(
            names,
            vec![
                "EnterCustomerFeedback",
                "GetAllCustomerFeedbacks",
                "PredictFeedbackSentiment"
            ]
        );
    }

    #[test]
    fn test_routes_follow_api_surface() {
        let policies = build_policies(TABLE_ARN, "us-east-1");

        assert_eq!(policies["EnterCustomerFeedback"]["Routes"][0], "POST /");
        assert_eq!(policies["GetAllCustomerFeedbacks"]["Routes"][0], "GET /");
        assert_eq!(
            policies["PredictFeedbackSentiment"]["Routes"][0],
            "GET /sentiment/{id}"
        );
    }

    #[test]
    fn test_read_function_policy_has_no_write_action() {
        let policies = build_policies(TABLE_ARN, "us-east-1");

        let statements = policies["GetAllCustomerFeedbacks"]["Policy"]["Statement"]
            .as_array()
            .unwrap();
        for statement in statements {
            for action in statement["Action"].as_array().unwrap() {
                assert!(!WRITE_ACTIONS.contains(&action.as_str().unwrap()));
            }
        }
    }

    #[test]
    fn test_cli_args_parse() {
        let args = CliArgs::parse_from([
            "print_policies",
            "--table-arn",
            TABLE_ARN,
            "--region",
            "eu-west-1",
        ]);

        assert_eq!(args.table_arn, TABLE_ARN);
        assert_eq!(args.region, "eu-west-1");
    }
}
