use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::models::Role;
use crate::session::{BearerToken, Session, SessionState};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// 持久化的会话记录
#[derive(Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: String,
    pub role: Role,
    pub user_id: Option<i64>,
    pub expires_at: Option<i64>, // Unix timestamp
}

impl PersistedSession {
    pub fn from_session(session: &Session) -> Option<Self> {
        Some(Self {
            token: session.token.as_ref()?.expose().to_string(),
            role: session.state.role()?,
            user_id: session.user_id,
            expires_at: session.expires_at,
        })
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn into_session(self) -> Session {
        Session {
            token: Some(BearerToken::new(self.token)),
            state: SessionState::from_role(self.role),
            user_id: self.user_id,
            expires_at: self.expires_at,
        }
    }
}

#[async_trait]
pub trait SessionPersistence: Send + Sync {
    async fn save(&self, session: &PersistedSession) -> Result<(), PersistenceError>;
    async fn load(&self) -> Result<Option<PersistedSession>, PersistenceError>;
    async fn clear(&self) -> Result<(), PersistenceError>;
}

/// 进程内保存，测试和无 Redis 环境使用
#[derive(Clone, Default)]
pub struct MemorySessionPersistence {
    slot: Arc<Mutex<Option<PersistedSession>>>,
}

impl MemorySessionPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

#[async_trait]
impl SessionPersistence for MemorySessionPersistence {
    async fn save(&self, session: &PersistedSession) -> Result<(), PersistenceError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedSession>, PersistenceError> {
        Ok(self.slot.lock().ok().and_then(|slot| slot.clone()))
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}

/// 会话缓存键前缀
const SESSION_PREFIX: &str = "careconnect:session:";

/// 未携带过期时间的会话默认保留一天
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 3600;

/// 生成会话缓存键
pub fn session_key(namespace: &str) -> String {
    format!("{}{}", SESSION_PREFIX, namespace)
}

/// Redis 会话存储，同一 namespace 下只保留一个会话
pub struct RedisSessionPersistence {
    redis: Arc<RedisClient>,
    namespace: String,
}

impl RedisSessionPersistence {
    pub fn new(redis: Arc<RedisClient>, namespace: impl Into<String>) -> Self {
        Self {
            redis,
            namespace: namespace.into(),
        }
    }

    pub fn open(redis_url: &str, namespace: impl Into<String>) -> Result<Self, PersistenceError> {
        let client = RedisClient::open(redis_url)?;
        Ok(Self::new(Arc::new(client), namespace))
    }
}

#[async_trait]
impl SessionPersistence for RedisSessionPersistence {
    async fn save(&self, session: &PersistedSession) -> Result<(), PersistenceError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        // 过期时间与令牌一致
        let ttl = match session.expires_at {
            Some(exp) => {
                let remaining = exp - chrono::Utc::now().timestamp();
                if remaining <= 0 {
                    return Ok(());
                }
                remaining as u64
            }
            None => DEFAULT_SESSION_TTL_SECS,
        };

        let json = serde_json::to_string(session)?;
        let _: () = conn.set_ex(session_key(&self.namespace), json, ttl).await?;

        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedSession>, PersistenceError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(session_key(&self.namespace)).await?;

        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(session_key(&self.namespace)).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    #[test]
    fn session_keys_are_namespaced() {
        assert_eq!(session_key("e2e"), "careconnect:session:e2e");
    }

    #[tokio::test]
    async fn sessions_survive_a_new_store() {
        let persistence = Arc::new(MemorySessionPersistence::new());

        let first = SessionStore::new().with_persistence(persistence.clone());
        first.establish("opaque", Some(Role::Doctor), Some(4)).await;
        assert!(!persistence.is_empty());

        let second = SessionStore::new().with_persistence(persistence.clone());
        assert_eq!(second.restore().await, SessionState::Doctor);
        assert_eq!(second.current().user_id, Some(4));

        second.logout().await;
        assert!(persistence.is_empty());
    }

    #[test]
    fn guests_are_not_persisted() {
        assert!(PersistedSession::from_session(&Session::guest()).is_none());
    }
}
