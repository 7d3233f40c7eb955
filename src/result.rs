use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::QueryStatus;
use crate::error::ApiError;

/// 查询结果：`{data, isLoading, isError}`
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub status: QueryStatus,
    pub error: Option<ApiError>,
}

impl<T> QueryResult<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self.status, QueryStatus::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, QueryStatus::Error)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, QueryStatus::Success)
    }

    pub fn uninitialized() -> Self {
        Self {
            data: None,
            status: QueryStatus::Uninitialized,
            error: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        QueryResult {
            data: self.data.map(f),
            status: self.status,
            error: self.error,
        }
    }
}

impl<T: DeserializeOwned> QueryResult<T> {
    /// 将缓存中的 JSON 转换为具体类型；解析失败视为错误状态
    pub(crate) fn from_raw(
        data: Option<&Value>,
        status: QueryStatus,
        error: Option<ApiError>,
    ) -> Self {
        match data.map(|value| serde_json::from_value::<T>(value.clone())) {
            Some(Ok(typed)) => Self {
                data: Some(typed),
                status,
                error,
            },
            Some(Err(e)) => Self {
                data: None,
                status: QueryStatus::Error,
                error: Some(ApiError::from(e)),
            },
            None => Self {
                data: None,
                status,
                error,
            },
        }
    }
}

/// 变更结果：`{data, isError}`
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult<T> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> MutationResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: ApiError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(ApiError::Decode("mutation returned no data".into())),
        }
    }
}

impl<T> From<Result<T, ApiError>> for MutationResult<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(error),
        }
    }
}
