use std::collections::BTreeSet;

use serde_json::Value;

use crate::api::tags::Tag;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStatus {
    #[default]
    Uninitialized,
    Loading,
    Success,
    Error,
}

/// 缓存条目的只读快照；视图只能读取快照
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub status: QueryStatus,
    pub data: Option<Value>,
    pub error: Option<ApiError>,
    pub tags: BTreeSet<Tag>,
    pub subscribers: usize,
    pub stale: bool,
    /// 进入 loading 的次数
    pub fetches: u64,
}
