//! 带缓存的端点调用入口
//!
//! 视图只通过 [`Api`] 发起查询与变更，缓存只由这里写入。

use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::watch;

use crate::api::client::ApiClient;
use crate::api::endpoint::{MutationEndpoint, QueryEndpoint};
use crate::api::models::{Login, LoginRequest, LoginResponse, Register, RegisterRequest, RegisterResponse};
use crate::cache::{CacheKey, EntrySnapshot, Fetcher, QueryCache, QueryStatus};
use crate::error::ApiError;
use crate::result::{MutationResult, QueryResult};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct Api {
    client: ApiClient,
    cache: QueryCache,
}

impl Api {
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn session(&self) -> &SessionStore {
        self.client.session()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// 计算缓存键并登记可重复执行的请求
    fn prepare<Q: QueryEndpoint>(&self, endpoint: &Q, arg: &Q::Arg) -> Result<CacheKey, ApiError> {
        let descriptor = endpoint.descriptor();
        let key = CacheKey::new(&descriptor.name, arg)?;
        let request = endpoint.request(arg)?;

        let client = self.client.clone();
        let fetcher: Fetcher = Arc::new(move || {
            let client = client.clone();
            let request = request.clone();
            async move { client.send(&request).await }.boxed()
        });
        self.cache.register(&key, &descriptor.tags, fetcher);
        Ok(key)
    }

    /// 调用查询并等待结果
    pub async fn query<Q: QueryEndpoint>(&self, endpoint: &Q, arg: Q::Arg) -> QueryResult<Q::Output> {
        let key = match self.prepare(endpoint, &arg) {
            Ok(key) => key,
            Err(e) => return failed_query(e),
        };
        match self.cache.query(&key).await {
            Some(snapshot) => typed(&snapshot),
            None => failed_query(ApiError::Decode(format!("cache entry {key} vanished"))),
        }
    }

    /// 强制重新请求
    pub async fn refetch<Q: QueryEndpoint>(&self, endpoint: &Q, arg: Q::Arg) -> QueryResult<Q::Output> {
        let key = match self.prepare(endpoint, &arg) {
            Ok(key) => key,
            Err(e) => return failed_query(e),
        };
        match self.cache.refetch(&key).await {
            Some(snapshot) => typed(&snapshot),
            None => failed_query(ApiError::Decode(format!("cache entry {key} vanished"))),
        }
    }

    /// 订阅查询：立即返回，数据按需在后台加载；订阅期间条目保持活跃
    pub fn subscribe<Q: QueryEndpoint>(&self, endpoint: &Q, arg: Q::Arg) -> QuerySubscription<Q::Output> {
        match self.prepare(endpoint, &arg) {
            Ok(key) => {
                let receiver = self.cache.subscribe(&key);
                self.cache.prefetch(&key);
                QuerySubscription {
                    cache: self.cache.clone(),
                    key: Some(key),
                    receiver,
                    failure: None,
                    _output: PhantomData,
                }
            }
            Err(e) => QuerySubscription {
                cache: self.cache.clone(),
                key: None,
                receiver: None,
                failure: Some(e),
                _output: PhantomData,
            },
        }
    }

    /// 执行变更；成功后使声明的标签失效
    ///
    /// 请求在独立任务中运行，调用方被丢弃也会完成。
    pub async fn mutate<M: MutationEndpoint>(&self, endpoint: &M, arg: M::Arg) -> MutationResult<M::Output> {
        let descriptor = endpoint.descriptor();
        let request = match endpoint.request(&arg) {
            Ok(request) => request,
            Err(e) => return MutationResult::failure(e),
        };

        let client = self.client.clone();
        let cache = self.cache.clone();
        let name = descriptor.name.clone();
        let tags = descriptor.tags.clone();
        let task = tokio::spawn(async move {
            let result = client.send(&request).await;
            match &result {
                Ok(_) if !tags.is_empty() => {
                    let refetched = cache.invalidate(&tags);
                    tracing::debug!("{} succeeded, {} queries refetching", name, refetched.len());
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("{} failed: {}", name, e),
            }
            result
        });

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(ApiError::Network(format!("mutation task failed: {e}"))),
        };
        result.and_then(decode::<M::Output>).into()
    }

    /// 登录并建立会话；上一位用户的缓存被清空
    pub async fn login(&self, email: &str, password: &str) -> MutationResult<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let result = self.mutate(&Login, request).await;
        if let Some(response) = &result.data {
            self.cache.reset();
            self.session()
                .establish(&response.token, Some(response.role()), Some(response.user.id))
                .await;
        }
        result
    }

    pub async fn register(&self, request: RegisterRequest) -> MutationResult<RegisterResponse> {
        self.mutate(&Register, request).await
    }

    pub async fn logout(&self) {
        self.session().logout().await;
        self.cache.reset();
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(typed) => Ok(typed),
        // 空响应体按空对象处理（如删除确认）
        Err(e) if value.is_null() => serde_json::from_value(json!({})).map_err(|_| ApiError::from(e)),
        Err(e) => Err(ApiError::from(e)),
    }
}

fn typed<T: DeserializeOwned>(snapshot: &EntrySnapshot) -> QueryResult<T> {
    QueryResult::from_raw(snapshot.data.as_ref(), snapshot.status, snapshot.error.clone())
}

fn failed_query<T>(error: ApiError) -> QueryResult<T> {
    QueryResult {
        data: None,
        status: QueryStatus::Error,
        error: Some(error),
    }
}

/// 一个视图对查询的订阅；丢弃即放弃关注，但不会取消进行中的请求
pub struct QuerySubscription<T> {
    cache: QueryCache,
    key: Option<CacheKey>,
    receiver: Option<watch::Receiver<u64>>,
    failure: Option<ApiError>,
    _output: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> QuerySubscription<T> {
    pub fn key(&self) -> Option<&CacheKey> {
        self.key.as_ref()
    }

    fn snapshot(&self) -> Option<EntrySnapshot> {
        self.key.as_ref().and_then(|key| self.cache.snapshot(key))
    }

    /// 当前状态，不等待
    pub fn current(&self) -> QueryResult<T> {
        if let Some(error) = &self.failure {
            return failed_query(error.clone());
        }
        match self.snapshot() {
            Some(snapshot) => typed(&snapshot),
            // 缓存被清空（如登出）
            None => QueryResult::uninitialized(),
        }
    }

    /// 已发起的请求次数
    pub fn fetches(&self) -> u64 {
        self.snapshot().map(|s| s.fetches).unwrap_or(0)
    }

    /// 等待下一次变化；条目消失时返回 false
    pub async fn changed(&mut self) -> bool {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.changed().await.is_ok(),
            None => false,
        }
    }

    /// 等待条目不再处于加载中
    pub async fn settled(&mut self) -> QueryResult<T> {
        self.settled_after(0).await
    }

    /// 等待至少完成 `fetches` 次请求后的稳定状态
    pub async fn settled_after(&mut self, fetches: u64) -> QueryResult<T> {
        loop {
            match self.snapshot() {
                Some(snapshot)
                    if snapshot.fetches >= fetches
                        && matches!(snapshot.status, QueryStatus::Success | QueryStatus::Error) =>
                {
                    return typed(&snapshot);
                }
                Some(_) => {}
                None => return self.current(),
            }
            if !self.changed().await {
                return self.current();
            }
        }
    }
}

impl<T> Drop for QuerySubscription<T> {
    fn drop(&mut self) {
        if let Some(key) = &self.key {
            self.cache.unsubscribe(key);
        }
    }
}
