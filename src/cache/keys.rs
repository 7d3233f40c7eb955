use std::fmt;

use serde::Serialize;

use crate::error::ApiError;

/// 缓存键：端点名 + 序列化后的参数
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub endpoint: String,
    pub arg: String,
}

impl CacheKey {
    pub fn new<A: Serialize>(endpoint: &str, arg: &A) -> Result<Self, ApiError> {
        Ok(Self {
            endpoint: endpoint.to_string(),
            arg: serde_json::to_string(arg)?,
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_arguments_produce_same_key() {
        let a = CacheKey::new("getDoctor", &7i64).unwrap();
        let b = CacheKey::new("getDoctor", &7i64).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "getDoctor(7)");
        assert_ne!(a, CacheKey::new("getDoctor", &8i64).unwrap());
        assert_eq!(CacheKey::new("getDoctors", &()).unwrap().arg, "null");
    }
}
