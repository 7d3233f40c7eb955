use std::sync::Arc;

use config::Config;
use redis::Client as RedisClient;

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod harness;
pub mod result;
pub mod router;
pub mod session;
pub mod stub;
pub mod ui;
pub mod utils;

use api::{Api, ApiClient, Interceptor};
use cache::QueryCache;
use error::ApiError;
use session::{RedisSessionPersistence, SessionStore};

/// Redis 中保存端到端会话的命名空间
pub const SESSION_NAMESPACE: &str = "e2e";

/// 一个客户端实例共享的状态：会话、查询缓存和端点入口
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: SessionStore,
    pub cache: QueryCache,
    pub api: Api,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        Self::build(config, None)
    }

    /// 所有请求先经过拦截器
    pub fn with_interceptor(config: Config, interceptor: Interceptor) -> Result<Self, ApiError> {
        Self::build(config, Some(interceptor))
    }

    fn build(config: Config, interceptor: Option<Interceptor>) -> Result<Self, ApiError> {
        let mut session = SessionStore::new();
        if let Some(redis_url) = &config.redis_url {
            match RedisClient::open(redis_url.as_str()) {
                Ok(client) => {
                    let persistence = RedisSessionPersistence::new(Arc::new(client), SESSION_NAMESPACE);
                    session = session.with_persistence(Arc::new(persistence));
                }
                Err(e) => tracing::warn!("Ignoring REDIS_URL, session will not persist: {}", e),
            }
        }

        let cache = QueryCache::new(config.cache_keep_unused());
        let mut client = ApiClient::new(&config, session.clone())?;
        if let Some(interceptor) = interceptor {
            client = client.with_interceptor(interceptor);
        }
        let api = Api::new(client, cache.clone());

        Ok(Self {
            config,
            session,
            cache,
            api,
        })
    }

    pub fn interceptor(&self) -> Option<&Interceptor> {
        self.api.client().interceptor()
    }
}
