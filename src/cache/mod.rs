// 查询缓存
// 按 (端点, 参数) 保存查询结果，并维护标签到缓存键的索引

pub mod keys;
pub mod models;
pub mod store;

pub use keys::CacheKey;
pub use models::{EntrySnapshot, QueryStatus};
pub use store::{Fetcher, QueryCache};
