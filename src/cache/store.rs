//! 进程内查询缓存
//!
//! - 同一缓存键同时只有一个进行中的请求，并发调用共享它。
//! - 每次发起请求分配递增序号，只有最近发起的请求能写回条目。
//! - 标签索引 `tag -> keys` 在注册与淘汰时增量维护，失效只访问受影响的键。
//! - 有订阅者的条目在失效时立即重新请求；没有订阅者的只标记为过期，
//!   下次调用时再请求。

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::sync::watch;

use crate::api::tags::Tag;
use crate::cache::keys::CacheKey;
use crate::cache::models::{EntrySnapshot, QueryStatus};
use crate::error::ApiError;

pub type FetchFuture = BoxFuture<'static, Result<Value, ApiError>>;

/// 重新执行某个查询的闭包，失效时由缓存自行调用
pub type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

type SharedFetch = Shared<FetchFuture>;

struct Entry {
    status: QueryStatus,
    data: Option<Value>,
    error: Option<ApiError>,
    tags: BTreeSet<Tag>,
    subscribers: usize,
    stale: bool,
    fetches: u64,
    latest_request: u64,
    in_flight: Option<(u64, SharedFetch)>,
    fetcher: Fetcher,
    last_used: Instant,
    version: watch::Sender<u64>,
}

impl Entry {
    fn new(fetcher: Fetcher) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            tags: BTreeSet::new(),
            subscribers: 0,
            stale: false,
            fetches: 0,
            latest_request: 0,
            in_flight: None,
            fetcher,
            last_used: Instant::now(),
            version,
        }
    }

    fn is_fresh(&self) -> bool {
        self.status == QueryStatus::Success && !self.stale
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            tags: self.tags.clone(),
            subscribers: self.subscribers,
            stale: self.stale,
            fetches: self.fetches,
        }
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    tag_index: HashMap<Tag, HashSet<CacheKey>>,
    next_request: u64,
}

impl Inner {
    fn index(&mut self, key: &CacheKey, tags: &[Tag]) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        for tag in tags {
            if entry.tags.insert(*tag) {
                self.tag_index.entry(*tag).or_default().insert(key.clone());
            }
        }
    }

    fn remove(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.remove(key) {
            for tag in entry.tags {
                if let Some(keys) = self.tag_index.get_mut(&tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.tag_index.remove(&tag);
                    }
                }
            }
        }
    }
}

/// 查询缓存，克隆共享同一份存储
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<Inner>>,
    keep_unused_for: Duration,
}

impl QueryCache {
    pub fn new(keep_unused_for: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            keep_unused_for,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 确保条目存在并登记标签；总是保留最新的 fetcher
    pub fn register(&self, key: &CacheKey, tags: &[Tag], fetcher: Fetcher) {
        let mut inner = self.lock();
        match inner.entries.get_mut(key) {
            Some(entry) => entry.fetcher = fetcher,
            None => {
                tracing::debug!("Registering cache entry {}", key);
                inner.entries.insert(key.clone(), Entry::new(fetcher));
            }
        }
        inner.index(key, tags);
    }

    /// 调用查询：新鲜数据直接返回，否则加入或发起请求并等待结果
    pub async fn query(&self, key: &CacheKey) -> Option<EntrySnapshot> {
        let pending = {
            let mut inner = self.lock();
            let entry = inner.entries.get_mut(key)?;
            entry.last_used = Instant::now();
            if entry.is_fresh() {
                None
            } else {
                Some(self.start_fetch(&mut inner, key, false)?)
            }
        };

        if let Some(pending) = pending {
            let _ = pending.await;
        }
        self.snapshot(key)
    }

    /// 启动请求但不等待；条目已新鲜或已有请求时不做任何事
    pub fn prefetch(&self, key: &CacheKey) {
        let mut inner = self.lock();
        let needs_fetch = inner
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_fresh() && entry.in_flight.is_none());
        if needs_fetch {
            let _ = self.start_fetch(&mut inner, key, false);
        }
    }

    /// 强制重新请求，较早的进行中请求结果将被丢弃
    pub async fn refetch(&self, key: &CacheKey) -> Option<EntrySnapshot> {
        let pending = {
            let mut inner = self.lock();
            self.start_fetch(&mut inner, key, true)?
        };
        let _ = pending.await;
        self.snapshot(key)
    }

    fn start_fetch(&self, inner: &mut Inner, key: &CacheKey, force: bool) -> Option<SharedFetch> {
        let entry = inner.entries.get(key)?;
        if !force {
            if let Some((_, shared)) = &entry.in_flight {
                tracing::debug!("Joining in-flight request for {}", key);
                return Some(shared.clone());
            }
        }

        inner.next_request += 1;
        let request_id = inner.next_request;
        let entry = inner.entries.get_mut(key)?;
        entry.latest_request = request_id;
        entry.status = QueryStatus::Loading;
        entry.fetches += 1;
        entry.notify();

        let fetch = (entry.fetcher)();
        let cache = self.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = fetch.await;
            cache.settle(&task_key, request_id, &result);
            result
        });

        let cache = self.clone();
        let join_key = key.clone();
        let shared = handle
            .map(move |joined| match joined {
                Ok(result) => result,
                Err(e) => {
                    let error = ApiError::Network(format!("query task failed: {e}"));
                    cache.settle(&join_key, request_id, &Err(error.clone()));
                    Err(error)
                }
            })
            .boxed()
            .shared();

        entry.in_flight = Some((request_id, shared.clone()));
        Some(shared)
    }

    /// 写回结果；只有最近发起的请求生效，失败时保留上次成功的数据
    fn settle(&self, key: &CacheKey, request_id: u64, result: &Result<Value, ApiError>) {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            return;
        };
        if entry.latest_request != request_id {
            tracing::debug!(
                "Discarding superseded response #{} for {} (latest #{})",
                request_id,
                key,
                entry.latest_request
            );
            return;
        }

        match result {
            Ok(value) => {
                entry.data = Some(value.clone());
                entry.error = None;
                entry.status = QueryStatus::Success;
                entry.stale = false;
            }
            Err(error) => {
                tracing::debug!("Query {} failed: {}", key, error);
                entry.error = Some(error.clone());
                entry.status = QueryStatus::Error;
            }
        }
        entry.in_flight = None;
        entry.notify();
    }

    /// 让带有任一标签的条目失效；返回重新请求的键
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<CacheKey> {
        let mut inner = self.lock();

        let affected: BTreeSet<CacheKey> = tags
            .iter()
            .filter_map(|tag| inner.tag_index.get(tag))
            .flat_map(|keys| keys.iter().cloned())
            .collect();

        let mut refetched = Vec::new();
        for key in affected {
            let active = inner
                .entries
                .get(&key)
                .is_some_and(|entry| entry.subscribers > 0);
            if active {
                if self.start_fetch(&mut inner, &key, true).is_some() {
                    refetched.push(key);
                }
            } else if let Some(entry) = inner.entries.get_mut(&key) {
                entry.stale = true;
                entry.notify();
            }
        }

        tracing::debug!(
            "Invalidated tags {:?}, refetching {} active entries",
            tags,
            refetched.len()
        );
        refetched
    }

    pub fn subscribe(&self, key: &CacheKey) -> Option<watch::Receiver<u64>> {
        let mut inner = self.lock();
        let entry = inner.entries.get_mut(key)?;
        entry.subscribers += 1;
        entry.last_used = Instant::now();
        Some(entry.version.subscribe())
    }

    pub fn unsubscribe(&self, key: &CacheKey) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            entry.last_used = Instant::now();
        }
    }

    pub fn snapshot(&self, key: &CacheKey) -> Option<EntrySnapshot> {
        self.lock().entries.get(key).map(Entry::snapshot)
    }

    pub fn keys_for(&self, tag: Tag) -> Vec<CacheKey> {
        let inner = self.lock();
        let mut keys: Vec<CacheKey> = inner
            .tag_index
            .get(&tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 淘汰长时间无人订阅的条目
    pub fn collect_garbage(&self, now: Instant) -> usize {
        let mut inner = self.lock();
        let expired: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.subscribers == 0
                    && entry.in_flight.is_none()
                    && now.saturating_duration_since(entry.last_used) >= self.keep_unused_for
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }
        if !expired.is_empty() {
            tracing::debug!("Evicted {} unused cache entries", expired.len());
        }
        expired.len()
    }

    /// 清空缓存（登出时）
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.tag_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use serde_json::json;
    use tokio::sync::Notify;

    fn counting_fetcher(calls: Arc<AtomicU64>) -> Fetcher {
        Arc::new(move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::task::yield_now().await;
                Ok(json!({ "call": n }))
            }
            .boxed()
        })
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::new(name, &()).unwrap()
    }

    #[tokio::test]
    async fn concurrent_queries_share_one_request() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicU64::new(0));
        let k = key("getDoctors");
        cache.register(&k, &[Tag::Doctor], counting_fetcher(calls.clone()));

        let (a, b) = tokio::join!(cache.query(&k), cache.query(&k));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap().data, b.unwrap().data);
        assert_eq!(cache.snapshot(&k).unwrap().fetches, 1);
    }

    #[tokio::test]
    async fn fresh_entries_are_served_from_cache() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicU64::new(0));
        let k = key("getServices");
        cache.register(&k, &[Tag::Service], counting_fetcher(calls.clone()));

        cache.query(&k).await;
        cache.query(&k).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_refetches_active_and_marks_inactive_stale() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let active_calls = Arc::new(AtomicU64::new(0));
        let idle_calls = Arc::new(AtomicU64::new(0));
        let active = key("getAppointments");
        let idle = key("getAppointment");
        let unrelated = key("getServices");

        cache.register(&active, &[Tag::Appointment], counting_fetcher(active_calls.clone()));
        cache.register(&idle, &[Tag::Appointment], counting_fetcher(idle_calls.clone()));
        cache.register(&unrelated, &[Tag::Service], counting_fetcher(Arc::new(AtomicU64::new(0))));
        for k in [&active, &idle, &unrelated] {
            cache.query(k).await;
        }

        let mut watcher = cache.subscribe(&active).unwrap();
        let refetched = cache.invalidate(&[Tag::Appointment]);
        assert_eq!(refetched, vec![active.clone()]);
        assert_eq!(cache.snapshot(&active).unwrap().status, QueryStatus::Loading);

        while cache.snapshot(&active).unwrap().status != QueryStatus::Success {
            watcher.changed().await.unwrap();
        }
        assert_eq!(active_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.snapshot(&active).unwrap().data, Some(json!({ "call": 2 })));

        let idle_snapshot = cache.snapshot(&idle).unwrap();
        assert!(idle_snapshot.stale);
        assert_eq!(idle_calls.load(Ordering::SeqCst), 1);
        cache.query(&idle).await;
        assert_eq!(idle_calls.load(Ordering::SeqCst), 2);

        let unrelated_snapshot = cache.snapshot(&unrelated).unwrap();
        assert!(!unrelated_snapshot.stale);
        assert_eq!(unrelated_snapshot.fetches, 1);
    }

    #[tokio::test]
    async fn failures_keep_last_known_good_data() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let k = key("getComplaints");
        let flag = fail.clone();
        let fetcher: Fetcher = Arc::new(move || {
            let failing = flag.load(Ordering::SeqCst);
            async move {
                if failing {
                    Err(ApiError::Server {
                        status: 500,
                        message: "boom".into(),
                    })
                } else {
                    Ok(json!(["first"]))
                }
            }
            .boxed()
        });
        cache.register(&k, &[Tag::Complaint], fetcher);
        cache.query(&k).await;

        fail.store(true, Ordering::SeqCst);
        let snapshot = cache.refetch(&k).await.unwrap();
        assert_eq!(snapshot.status, QueryStatus::Error);
        assert_eq!(snapshot.data, Some(json!(["first"])));
        assert!(matches!(snapshot.error, Some(ApiError::Server { status: 500, .. })));
    }

    #[tokio::test]
    async fn most_recently_initiated_request_wins() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicU64::new(0));
        let k = key("getUsers");

        let (g, c) = (gate.clone(), calls.clone());
        let fetcher: Fetcher = Arc::new(move || {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            let gate = g.clone();
            async move {
                // 第一个请求被挂起，直到第二个请求完成
                if n == 1 {
                    gate.notified().await;
                }
                Ok(json!({ "call": n }))
            }
            .boxed()
        });
        cache.register(&k, &[Tag::User], fetcher);

        cache.prefetch(&k);
        let second = cache.refetch(&k).await.unwrap();
        assert_eq!(second.data, Some(json!({ "call": 2 })));

        let mut watcher = cache.subscribe(&k).unwrap();
        gate.notify_one();
        // 旧响应被丢弃，不会产生新版本
        let outcome = tokio::time::timeout(Duration::from_millis(100), watcher.changed()).await;
        assert!(outcome.is_err());
        assert_eq!(cache.snapshot(&k).unwrap().data, Some(json!({ "call": 2 })));
    }

    #[tokio::test]
    async fn unused_entries_are_evicted_and_unindexed() {
        let cache = QueryCache::new(Duration::from_secs(0));
        let k = key("getPayments");
        cache.register(&k, &[Tag::Payment], counting_fetcher(Arc::new(AtomicU64::new(0))));
        cache.query(&k).await;

        let _watcher = cache.subscribe(&k).unwrap();
        assert_eq!(cache.collect_garbage(Instant::now()), 0);

        cache.unsubscribe(&k);
        assert_eq!(cache.collect_garbage(Instant::now()), 1);
        assert!(cache.is_empty());
        assert!(cache.keys_for(Tag::Payment).is_empty());
    }
}
