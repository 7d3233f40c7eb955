use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::ui::toast::Toast;

/// 错误在界面上的表现
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// 弹出通知，数据保持上次成功的值
    Toast(Toast),
    /// 表单内联错误，不改变任何状态
    Inline {
        message: String,
        fields: BTreeMap<String, String>,
    },
    /// 会话已清除，需要重新登录
    SignIn(Toast),
}

pub fn translate(error: &ApiError) -> Feedback {
    match error {
        ApiError::Validation {
            message, fields, ..
        } if !fields.is_empty() => Feedback::Inline {
            message: message.clone(),
            fields: fields.clone(),
        },
        ApiError::Unauthorized(_) => Feedback::SignIn(Toast::error(error.user_message())),
        other => Feedback::Toast(Toast::error(other.user_message())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_stay_inline() {
        let error = ApiError::from_status(
            422,
            r#"{"message":"Invalid","errors":{"amount":"Amount must be positive"}}"#,
        );
        match translate(&error) {
            Feedback::Inline { fields, .. } => {
                assert_eq!(fields["amount"], "Amount must be positive");
            }
            other => panic!("unexpected feedback {other:?}"),
        }
    }

    #[test]
    fn server_failures_become_error_toasts() {
        let error = ApiError::from_status(500, r#"{"error":"Database unavailable"}"#);
        assert_eq!(
            translate(&error),
            Feedback::Toast(Toast::error("Database unavailable"))
        );
    }

    #[test]
    fn unauthorized_requires_sign_in() {
        let error = ApiError::Unauthorized("expired".into());
        assert!(matches!(translate(&error), Feedback::SignIn(_)));
    }
}
