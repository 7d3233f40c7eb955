//! 会话与认证状态
//!
//! 会话保存当前令牌与角色。状态机只有四个状态：`Guest`、`Admin`、
//! `Doctor`、`Patient`。登录成功进入对应角色；登出或任一端点返回认证
//! 失败时回到 `Guest`。所有转换都经过 [`transition`]。

use std::fmt;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use chrono::Utc;
use tokio::sync::watch;

use crate::api::models::Role;
use crate::utils::{peek_claims, token_fingerprint};

pub mod persistence;

pub use persistence::{
    MemorySessionPersistence, PersistedSession, PersistenceError, RedisSessionPersistence,
    SessionPersistence,
};

/// 不透明的访问令牌；不实现 `Display`，`Debug` 只输出指纹
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn fingerprint(&self) -> String {
        token_fingerprint(&self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken({})", self.fingerprint())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Guest,
    Admin,
    Doctor,
    Patient,
}

impl SessionState {
    pub fn from_role(role: Role) -> Self {
        match role {
            Role::Admin => SessionState::Admin,
            Role::Doctor => SessionState::Doctor,
            Role::Patient => SessionState::Patient,
        }
    }

    pub fn role(self) -> Option<Role> {
        match self {
            SessionState::Guest => None,
            SessionState::Admin => Some(Role::Admin),
            SessionState::Doctor => Some(Role::Doctor),
            SessionState::Patient => Some(Role::Patient),
        }
    }

    pub fn is_guest(self) -> bool {
        self == SessionState::Guest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    LoginSucceeded(Role),
    LoggedOut,
    /// 401、令牌过期
    AuthFailed,
}

/// 会话状态转换表
pub fn transition(state: SessionState, event: AuthEvent) -> SessionState {
    match (state, event) {
        (_, AuthEvent::LoginSucceeded(role)) => SessionState::from_role(role),
        (_, AuthEvent::LoggedOut) | (_, AuthEvent::AuthFailed) => SessionState::Guest,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<BearerToken>,
    pub state: SessionState,
    pub user_id: Option<i64>,
    /// Unix 时间戳，来自 JWT 的 `exp`
    pub expires_at: Option<i64>,
}

impl Session {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// 进程内共享的会话存储
///
/// 持久化（如 Redis）是可选的，失败只记录日志，不影响内存中的会话。
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
    changes: Arc<watch::Sender<SessionState>>,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(SessionState::Guest);
        Self {
            inner: Arc::new(RwLock::new(Session::guest())),
            changes: Arc::new(changes),
            persistence: None,
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn SessionPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// 当前会话；令牌已过期时先转换为访客
    pub fn current(&self) -> Session {
        let session = self.read();
        if session.is_expired(Utc::now().timestamp()) {
            tracing::info!("Session token expired, returning to guest");
            self.apply(AuthEvent::AuthFailed, Session::guest());
            return Session::guest();
        }
        session
    }

    pub fn state(&self) -> SessionState {
        self.current().state
    }

    pub fn token(&self) -> Option<BearerToken> {
        self.current().token
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.changes.subscribe()
    }

    /// 登录成功：角色以后端返回为准，缺失时读取令牌中的声明
    pub async fn establish(&self, token: &str, role: Option<Role>, user_id: Option<i64>) -> SessionState {
        let claims = peek_claims(token);
        let role = match role.or_else(|| claims.as_ref().map(|c| c.role)) {
            Some(role) => role,
            None => {
                tracing::warn!("Login response carried no role claim, staying guest");
                return self.state();
            }
        };
        let user_id = user_id.or_else(|| claims.as_ref().and_then(|c| c.sub.parse().ok()));

        let token = BearerToken::new(token);
        let session = Session {
            token: Some(token.clone()),
            state: SessionState::from_role(role),
            user_id,
            expires_at: claims.map(|c| c.exp),
        };
        tracing::info!(
            role = %role,
            token = %token.fingerprint(),
            "Session established"
        );
        let state = self.apply(AuthEvent::LoginSucceeded(role), session.clone());

        if let Some(persistence) = &self.persistence {
            if let Some(record) = PersistedSession::from_session(&session) {
                if let Err(e) = persistence.save(&record).await {
                    tracing::warn!("Failed to persist session: {}", e);
                }
            }
        }
        state
    }

    pub async fn logout(&self) {
        tracing::info!("Logging out");
        self.apply(AuthEvent::LoggedOut, Session::guest());
        self.forget().await;
    }

    /// 端点以 `token` 发出的请求返回认证失败
    ///
    /// 只有当前会话仍持有该令牌时才清空；期间已重新登录则忽略。
    pub async fn auth_failed_for(&self, token: &BearerToken) {
        let cleared = {
            let mut guard = self.write();
            if guard.token.as_ref() != Some(token) {
                None
            } else {
                let state = transition(guard.state, AuthEvent::AuthFailed);
                *guard = Session::guest();
                Some(state)
            }
        };
        let Some(state) = cleared else {
            tracing::debug!(
                token = %token.fingerprint(),
                "Ignoring authentication failure of a superseded session"
            );
            return;
        };
        tracing::warn!("Authentication failure, clearing session");
        self.changes.send_replace(state);
        self.forget().await;
    }

    /// 从持久化存储恢复会话（如页面刷新后）
    pub async fn restore(&self) -> SessionState {
        let Some(persistence) = &self.persistence else {
            return self.state();
        };
        match persistence.load().await {
            Ok(Some(record)) if !record.is_expired(Utc::now().timestamp()) => {
                self.apply(
                    AuthEvent::LoginSucceeded(record.role),
                    record.into_session(),
                )
            }
            Ok(_) => self.state(),
            Err(e) => {
                tracing::warn!("Failed to restore session: {}", e);
                self.state()
            }
        }
    }

    fn read(&self) -> Session {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn apply(&self, event: AuthEvent, next: Session) -> SessionState {
        let mut guard = self.write();
        let state = transition(guard.state, event);
        debug_assert_eq!(state, next.state);
        *guard = next;
        drop(guard);

        self.changes.send_replace(state);
        state
    }

    async fn forget(&self) {
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.clear().await {
                tracing::warn!("Failed to clear persisted session: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_token;

    #[test]
    fn transitions_follow_the_table() {
        use AuthEvent::*;
        use SessionState::*;

        assert_eq!(transition(Guest, LoginSucceeded(Role::Admin)), Admin);
        assert_eq!(transition(Guest, LoginSucceeded(Role::Doctor)), Doctor);
        assert_eq!(transition(Patient, LoggedOut), Guest);
        assert_eq!(transition(Doctor, AuthFailed), Guest);
        assert_eq!(transition(Guest, AuthFailed), Guest);
    }

    #[tokio::test]
    async fn role_falls_back_to_token_claim() {
        let store = SessionStore::new();
        let (token, _) = generate_token(11, Role::Doctor, "secret", 600).unwrap();

        let state = store.establish(&token, None, None).await;
        assert_eq!(state, SessionState::Doctor);
        assert_eq!(store.current().user_id, Some(11));
        assert_eq!(store.token().unwrap().expose(), token);
    }

    #[tokio::test]
    async fn opaque_token_without_role_stays_guest() {
        let store = SessionStore::new();
        let state = store.establish("opaque", None, Some(1)).await;
        assert_eq!(state, SessionState::Guest);
        assert!(store.token().is_none());
    }

    #[tokio::test]
    async fn expired_tokens_end_the_session() {
        let store = SessionStore::new();
        let (token, _) = generate_token(2, Role::Patient, "secret", -10).unwrap();
        store.establish(&token, Some(Role::Patient), Some(2)).await;

        assert_eq!(store.state(), SessionState::Guest);
        assert!(store.token().is_none());
    }

    #[tokio::test]
    async fn watchers_see_auth_failures() {
        let store = SessionStore::new();
        let mut changes = store.subscribe();
        store.establish("opaque", Some(Role::Admin), Some(1)).await;
        assert_eq!(*changes.borrow_and_update(), SessionState::Admin);

        store.auth_failed_for(&BearerToken::new("opaque")).await;
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), SessionState::Guest);
    }

    #[tokio::test]
    async fn failures_of_a_previous_session_are_ignored() {
        let store = SessionStore::new();
        store.establish("first-login", Some(Role::Patient), Some(3)).await;
        let stale = store.token().unwrap();

        store.logout().await;
        store.establish("second-login", Some(Role::Admin), Some(1)).await;
        store.auth_failed_for(&stale).await;

        assert_eq!(store.state(), SessionState::Admin);
        assert_eq!(store.token().unwrap().expose(), "second-login");

        store.auth_failed_for(&BearerToken::new("second-login")).await;
        assert_eq!(store.state(), SessionState::Guest);
    }

    #[test]
    fn token_debug_output_is_redacted() {
        let token = BearerToken::new("super-secret-token");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains(&token.fingerprint()));
    }
}
