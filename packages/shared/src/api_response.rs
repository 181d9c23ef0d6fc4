//! # API レスポンスエンベロープ
//!
//! 公開 API の統一レスポンス形式 `{ "message": string, "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 公開 API の統一レスポンス型
///
/// すべての成功レスポンスは `{ "message": ..., "data": T }` 形式で返す。
/// `message` はフロントエンドがそのままトースト表示できる短い英文。
///
/// ## 使用例
///
/// ```
/// use roomiez_shared::ApiResponse;
///
/// let response = ApiResponse::new("House created successfully!", 42);
/// assert_eq!(response.data, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data:    T,
}

impl<T> ApiResponse<T> {
    /// 新しい `ApiResponse` を作成する
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_serializeを正しいjson形状にする() {
        let response = ApiResponse::new("ok", "hello");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "message": "ok", "data": "hello" })
        );
    }

    #[test]
    fn test_deserializeでjsonからオブジェクトに変換する() {
        let json = r#"{"message": "done", "data": [1, 2]}"#;
        let response: ApiResponse<Vec<i32>> = serde_json::from_str(json).unwrap();

        assert_eq!(response.message, "done");
        assert_eq!(response.data, vec![1, 2]);
    }
}
