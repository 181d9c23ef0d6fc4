//! DynamoDB アイテムの属性読み出しヘルパー

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use roomiez_domain::DomainError;

use crate::InfraError;

pub(crate) type Item = HashMap<String, AttributeValue>;

/// 文字列属性を取得する
pub(crate) fn get_s(item: &Item, key: &str) -> Result<String, InfraError> {
    get_opt_s(item, key)
        .ok_or_else(|| InfraError::dynamo_db(format!("属性 '{key}' が見つかりません")))
}

/// 省略可能な文字列属性を取得する
///
/// NULL 型で保存されている場合も `None` を返す。
pub(crate) fn get_opt_s(item: &Item, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).cloned()
}

/// 省略可能な数値属性を f64 として取得する
pub(crate) fn get_opt_f64(item: &Item, key: &str) -> Result<Option<f64>, InfraError> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .map(|n| {
            n.parse::<f64>()
                .map_err(|e| InfraError::dynamo_db(format!("数値属性 '{key}' のパースに失敗: {e}")))
        })
        .transpose()
}

/// 省略可能な真偽値属性を取得する
pub(crate) fn get_opt_bool(item: &Item, key: &str) -> Option<bool> {
    item.get(key).and_then(|v| v.as_bool().ok()).copied()
}

/// 文字列リスト属性（`L` of `S`）を取得する
///
/// 属性が存在しない場合は空のリストを返す。
pub(crate) fn get_string_list(item: &Item, key: &str) -> Result<Vec<String>, InfraError> {
    let Some(value) = item.get(key) else {
        return Ok(Vec::new());
    };
    let list = value
        .as_l()
        .map_err(|_| InfraError::dynamo_db(format!("属性 '{key}' がリストではありません")))?;

    list.iter()
        .map(|v| {
            v.as_s().cloned().map_err(|_| {
                InfraError::dynamo_db(format!("属性 '{key}' に文字列以外の要素があります"))
            })
        })
        .collect()
}

/// RFC 3339 のタイムスタンプ属性を取得する
pub(crate) fn get_timestamp(item: &Item, key: &str) -> Result<DateTime<Utc>, InfraError> {
    parse_timestamp(key, &get_s(item, key)?)
}

/// 省略可能な RFC 3339 のタイムスタンプ属性を取得する
pub(crate) fn get_opt_timestamp(
    item: &Item,
    key: &str,
) -> Result<Option<DateTime<Utc>>, InfraError> {
    get_opt_s(item, key)
        .map(|s| parse_timestamp(key, &s))
        .transpose()
}

fn parse_timestamp(key: &str, value: &str) -> Result<DateTime<Utc>, InfraError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| InfraError::dynamo_db(format!("属性 '{key}' の日時のパースに失敗: {e}")))
}

/// 保存済みの値がドメインの検証に通らなかった場合のエラー変換
pub(crate) fn invalid_stored(key: &'static str) -> impl Fn(DomainError) -> InfraError {
    move |e| InfraError::dynamo_db(format!("属性 '{key}' の値が不正です: {e}"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn item(pairs: Vec<(&str, AttributeValue)>) -> Item {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_get_sは存在しない属性でエラーを返す() {
        let item = item(vec![]);
        assert!(get_s(&item, "uid").is_err());
    }

    #[test]
    fn test_get_opt_f64は数値文字列をパースする() {
        let item = item(vec![("balance", AttributeValue::N("-12.5".to_string()))]);

        assert_eq!(get_opt_f64(&item, "balance").unwrap(), Some(-12.5));
        assert_eq!(get_opt_f64(&item, "missing").unwrap(), None);
    }

    #[test]
    fn test_get_string_listは存在しない属性で空リストを返す() {
        let item = item(vec![(
            "members",
            AttributeValue::L(vec![
                AttributeValue::S("a@example.com".to_string()),
                AttributeValue::S("b@example.com".to_string()),
            ]),
        )]);

        assert_eq!(
            get_string_list(&item, "members").unwrap(),
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
        assert!(get_string_list(&item, "other").unwrap().is_empty());
    }

    #[test]
    fn test_get_string_listは文字列以外の要素でエラーを返す() {
        let item = item(vec![(
            "members",
            AttributeValue::L(vec![AttributeValue::N("1".to_string())]),
        )]);

        assert!(get_string_list(&item, "members").is_err());
    }

    #[test]
    fn test_get_opt_timestampはrfc3339をパースする() {
        let item = item(vec![(
            "created_at",
            AttributeValue::S("2026-01-02T03:04:05Z".to_string()),
        )]);

        let ts = get_opt_timestamp(&item, "created_at").unwrap().unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-02T03:04:05+00:00");
    }
}
