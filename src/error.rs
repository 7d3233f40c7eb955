use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 端点层对外暴露的错误分类
///
/// 端点层从不跨边界 panic，所有失败都以该类型出现在结果对象中。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 没有收到响应（连接失败、超时等）
    #[error("network error: {0}")]
    Network(String),

    /// 401，或访问需要认证的端点时没有会话
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// 4xx，带字段级错误
    #[error("validation failed: {message}")]
    Validation {
        status: u16,
        message: String,
        fields: BTreeMap<String, String>,
    },

    /// 5xx
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// 响应体无法解析
    #[error("malformed response: {0}")]
    Decode(String),
}

/// 后端错误响应体：`{error|message, errors?}`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: Some(message.into()),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: &str, message: &str) -> Self {
        self.errors.insert(field.to_string(), message.to_string());
        self
    }

    /// `error` 优先于 `message`
    pub fn text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

impl ApiError {
    /// 由非 2xx 状态码和响应体构造错误
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .text()
            .map(str::to_string)
            .unwrap_or_else(|| default_message(status).to_string());

        match status {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            400..=499 => ApiError::Validation {
                status,
                message,
                fields: parsed.errors,
            },
            _ => ApiError::Server { status, message },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// 适合直接展示给用户的文字
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Network(_) => "Unable to reach the server. Please try again.",
            ApiError::Unauthorized(_) => "Your session has expired. Please log in again.",
            ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::Validation { message, .. }
            | ApiError::Server { message, .. } => message,
            ApiError::Decode(_) => "Unexpected response from the server.",
        }
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        401 => "Authentication required",
        403 => "Permission denied",
        404 => "Resource not found",
        400..=499 => "Invalid request",
        _ => "Internal server error",
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            // reqwest 的错误信息不含请求头，可以安全记录
            ApiError::Network(err.without_url().to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert_eq!(
            ApiError::from_status(401, r#"{"error":"jwt expired"}"#),
            ApiError::Unauthorized("jwt expired".into())
        );
        assert!(matches!(
            ApiError::from_status(503, ""),
            ApiError::Server { status: 503, .. }
        ));
        assert!(matches!(ApiError::from_status(404, "{}"), ApiError::NotFound(_)));
    }

    #[test]
    fn validation_errors_keep_field_details() {
        let err = ApiError::from_status(
            422,
            r#"{"message":"Invalid appointment","errors":{"date":"Date is required"}}"#,
        );
        match err {
            ApiError::Validation {
                status,
                message,
                fields,
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid appointment");
                assert_eq!(fields.get("date").map(String::as_str), Some("Date is required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_field_wins_over_message() {
        let body = ErrorBody {
            error: Some("primary".into()),
            message: Some("secondary".into()),
            errors: BTreeMap::new(),
        };
        assert_eq!(body.text(), Some("primary"));
    }
}
