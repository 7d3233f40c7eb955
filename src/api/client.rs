use std::sync::Arc;

use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use uuid::Uuid;

use crate::api::endpoint::{ApiRequest, AuthRequirement};
use crate::api::intercept::{InterceptedCall, Interceptor};
use crate::config::Config;
use crate::error::ApiError;
use crate::session::{BearerToken, SessionStore};

/// 追踪请求头，仅发送给配置允许的来源
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// REST 客户端
///
/// 发送前从共享会话读取令牌并附加 `Authorization: Bearer`；令牌只出现在
/// 请求头中，日志里只记录指纹。
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    config: Arc<Config>,
    session: SessionStore,
    interceptor: Option<Interceptor>,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionStore) -> Result<Self, ApiError> {
        let base = Url::parse(&config.api_domain)
            .map_err(|e| ApiError::Network(format!("invalid API domain: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Network(format!(
                "API domain {} cannot be used as a base URL",
                config.api_domain
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            http,
            base,
            config: Arc::new(config.clone()),
            session,
            interceptor: None,
        })
    }

    pub fn with_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn interceptor(&self) -> Option<&Interceptor> {
        self.interceptor.as_ref()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// 由路径段拼出完整地址，每一段都会被编码
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Network("API domain cannot carry a path".into()))?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }

    pub async fn send(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let url = self.url_for(request)?;
        let path = request.path();

        let token = match request.auth {
            AuthRequirement::Bearer => match self.session.token() {
                Some(token) => Some(token),
                None => {
                    tracing::debug!("{} {} rejected locally: no active session", request.method, path);
                    return Err(ApiError::Unauthorized("no active session".into()));
                }
            },
            // 公开端点也带上已有令牌，后端可据此识别管理员
            AuthRequirement::Public => self.session.token(),
        };

        let route = self
            .interceptor
            .as_ref()
            .and_then(|interceptor| interceptor.route(request.method, &path));

        let (status, text) = match route.as_ref().and_then(|route| route.reply.as_ref().map(|reply| (route, reply))) {
            Some((route, reply)) => {
                tracing::debug!("{} {} answered by stub @{}", request.method, path, route.alias);
                let text = if reply.body.is_null() {
                    String::new()
                } else {
                    reply.body.to_string()
                };
                (reply.status, text)
            }
            None => self.exchange(request, url, &path, token.as_ref()).await?,
        };

        if let (Some(interceptor), Some(route)) = (&self.interceptor, &route) {
            interceptor.record(InterceptedCall {
                alias: route.alias.clone(),
                method: request.method,
                path: path.clone(),
                request_body: request.body.clone(),
                status,
                response_body: serde_json::from_str(&text).unwrap_or(Value::Null),
            });
        }

        if (200..300).contains(&status) {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(ApiError::from);
        }

        let error = ApiError::from_status(status, &text);
        match &error {
            ApiError::Unauthorized(_) => {
                tracing::warn!("{} {} returned 401", request.method, path);
                // 只清空发出请求时的那个会话
                if let Some(token) = &token {
                    self.session.auth_failed_for(token).await;
                }
            }
            ApiError::Server { status, message } => {
                tracing::error!(
                    "Server error occurred - {} {} - Status: {}, Body: {}",
                    request.method,
                    path,
                    status,
                    message
                );
            }
            other => {
                tracing::info!("{} {} failed: {}", request.method, path, other);
            }
        }
        Err(error)
    }

    /// 真正发出请求，返回状态码与响应体
    async fn exchange(
        &self,
        request: &ApiRequest,
        url: Url,
        path: &str,
        token: Option<&BearerToken>,
    ) -> Result<(u16, String), ApiError> {
        let traced = self.config.is_traced_origin(url.as_str());
        let mut builder = self
            .http
            .request(request.method.to_reqwest(), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose());
        }
        if traced {
            builder = builder.header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(
            method = %request.method,
            path = %path,
            token = %token.map(|t| t.fingerprint()).unwrap_or_default(),
            "Dispatching request"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} {} failed without response: {}", request.method, path, e.without_url());
                return Err(ApiError::Network(format!("{} {} failed", request.method, path)));
            }
        };

        let status = response.status().as_u16();
        let text = response.text().await.map_err(ApiError::from)?;
        Ok((status, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::endpoint::{EndpointDescriptor, HttpMethod};

    fn client(domain: &str) -> ApiClient {
        ApiClient::new(&Config::for_domain(domain), SessionStore::new()).unwrap()
    }

    #[test]
    fn segments_are_encoded_under_the_base_path() {
        let client = client("https://api.example.com/v1/");
        let descriptor = EndpointDescriptor::query("getServiceByTitle", "/service/title/:title", &[]);
        let request = ApiRequest::new(&descriptor, &["service", "title", "Eye Care/Adults"]);

        let url = client.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/service/title/Eye%20Care%2FAdults"
        );
    }

    #[tokio::test]
    async fn authenticated_endpoints_fail_without_session() {
        // 端口 9 上没有服务；若真的发出请求会得到网络错误而不是认证错误
        let client = client("http://127.0.0.1:9");
        let descriptor = EndpointDescriptor::query("getDoctors", "/doctors", &[]);
        let request = ApiRequest::new(&descriptor, &["doctors"]);

        let err = client.send(&request).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn late_rejection_keeps_a_newer_session() {
        use crate::api::models::Role;
        use crate::session::SessionState;
        use std::time::Duration;

        let app = axum::Router::new().route(
            "/doctors",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                axum::http::StatusCode::UNAUTHORIZED
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let session = SessionStore::new();
        session.establish("first-login", Some(Role::Patient), Some(3)).await;
        let config = Config::for_domain(&format!("http://{addr}"));
        let client = ApiClient::new(&config, session.clone()).unwrap();
        let descriptor = EndpointDescriptor::query("getDoctors", "/doctors", &[]);
        let request = ApiRequest::new(&descriptor, &["doctors"]);

        let relogin = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            session.logout().await;
            session.establish("second-login", Some(Role::Admin), Some(1)).await;
        };
        let (result, _) = tokio::join!(client.send(&request), relogin);

        assert!(result.unwrap_err().is_unauthorized());
        assert_eq!(session.state(), SessionState::Admin);
        assert_eq!(session.token().unwrap().expose(), "second-login");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let client = client("http://127.0.0.1:9");
        let descriptor =
            EndpointDescriptor::mutation("login", HttpMethod::Post, "/user/login", &[]).public();
        let request = ApiRequest::new(&descriptor, &["user", "login"]);

        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
