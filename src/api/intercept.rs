//! 请求拦截
//!
//! 按方法和路径通配符登记规则；命中的请求被记录，带有预设响应的规则
//! 不会发出网络请求。`*` 匹配单个路径段，`**` 匹配任意多段。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tokio::sync::Notify;

use crate::api::endpoint::HttpMethod;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct StubReply {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedCall {
    pub alias: String,
    pub method: HttpMethod,
    pub path: String,
    pub request_body: Option<Value>,
    pub status: u16,
    pub response_body: Value,
}

struct Rule {
    alias: String,
    method: HttpMethod,
    pattern: Regex,
    reply: Option<StubReply>,
}

/// 命中规则后的处理方式
#[derive(Debug, Clone)]
pub struct Route {
    pub alias: String,
    pub reply: Option<StubReply>,
}

#[derive(Default)]
struct State {
    rules: Vec<Rule>,
    calls: HashMap<String, Vec<InterceptedCall>>,
}

#[derive(Clone, Default)]
pub struct Interceptor {
    state: Arc<Mutex<State>>,
    recorded: Arc<Notify>,
}

/// 通配符转换为锚定的正则
pub fn glob_to_regex(glob: &str) -> Result<Regex, ApiError> {
    let mut pattern = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                pattern.push_str(".*");
            } else {
                pattern.push_str("[^/]*");
            }
        } else {
            pattern.push_str(&regex::escape(&c.to_string()));
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| ApiError::Decode(format!("invalid route pattern {glob}: {e}")))
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 只记录，请求照常发出
    pub fn spy(&self, alias: &str, method: HttpMethod, glob: &str) -> Result<(), ApiError> {
        self.add(alias, method, glob, None)
    }

    /// 以预设响应代替后端
    pub fn stub(
        &self,
        alias: &str,
        method: HttpMethod,
        glob: &str,
        status: u16,
        body: Value,
    ) -> Result<(), ApiError> {
        self.add(alias, method, glob, Some(StubReply { status, body }))
    }

    fn add(&self, alias: &str, method: HttpMethod, glob: &str, reply: Option<StubReply>) -> Result<(), ApiError> {
        let pattern = glob_to_regex(glob)?;
        let mut state = self.lock();
        // 后登记的规则优先
        state.rules.insert(
            0,
            Rule {
                alias: alias.to_string(),
                method,
                pattern,
                reply,
            },
        );
        state.calls.entry(alias.to_string()).or_default();
        Ok(())
    }

    pub fn route(&self, method: HttpMethod, path: &str) -> Option<Route> {
        self.lock()
            .rules
            .iter()
            .find(|rule| rule.method == method && rule.pattern.is_match(path))
            .map(|rule| Route {
                alias: rule.alias.clone(),
                reply: rule.reply.clone(),
            })
    }

    pub fn record(&self, call: InterceptedCall) {
        tracing::debug!("Intercepted {} {} as @{} ({})", call.method, call.path, call.alias, call.status);
        self.lock().calls.entry(call.alias.clone()).or_default().push(call);
        self.recorded.notify_waiters();
    }

    pub fn calls(&self, alias: &str) -> Vec<InterceptedCall> {
        self.lock().calls.get(alias).cloned().unwrap_or_default()
    }

    /// 等待别名下的第 `nth` 次调用（从 0 开始）
    pub async fn wait(&self, alias: &str, nth: usize, timeout: Duration) -> Option<InterceptedCall> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.recorded.notified();
            if let Some(call) = self.calls(alias).get(nth) {
                return Some(call.clone());
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.rules.clear();
        state.calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn globs_match_segments() {
        let single = glob_to_regex("**/doctor/*").unwrap();
        assert!(single.is_match("/doctor/12"));
        assert!(single.is_match("/v1/doctor/12"));
        assert!(!single.is_match("/doctor/12/notes"));

        let exact = glob_to_regex("/user/login").unwrap();
        assert!(exact.is_match("/user/login"));
        assert!(!exact.is_match("/user/login2"));
    }

    #[test]
    fn later_rules_take_precedence() {
        let interceptor = Interceptor::new();
        interceptor.spy("any", HttpMethod::Post, "**").unwrap();
        interceptor
            .stub("pay", HttpMethod::Post, "**/payment/register", 201, json!({"id": 1}))
            .unwrap();

        let route = interceptor.route(HttpMethod::Post, "/payment/register").unwrap();
        assert_eq!(route.alias, "pay");
        assert_eq!(route.reply.unwrap().status, 201);
        assert_eq!(interceptor.route(HttpMethod::Post, "/user/register").unwrap().alias, "any");
        assert!(interceptor.route(HttpMethod::Get, "/payments").is_none());
    }

    #[tokio::test]
    async fn wait_returns_recorded_calls() {
        let interceptor = Interceptor::new();
        interceptor.spy("delete", HttpMethod::Delete, "**/doctor/*").unwrap();

        let recorder = interceptor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            recorder.record(InterceptedCall {
                alias: "delete".into(),
                method: HttpMethod::Delete,
                path: "/doctor/3".into(),
                request_body: None,
                status: 200,
                response_body: json!({}),
            });
        });

        let call = interceptor.wait("delete", 0, Duration::from_secs(2)).await.unwrap();
        assert_eq!(call.path, "/doctor/3");
        assert!(interceptor.wait("delete", 1, Duration::from_millis(30)).await.is_none());
    }
}
