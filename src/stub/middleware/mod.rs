mod auth;
mod error_handler;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::stub::state::StubState;

pub use auth::auth_middleware;
pub use error_handler::log_errors;

/// 按 `METHOD /path` 计数，测试用来断言请求次数
pub async fn record_hits(State(state): State<StubState>, request: Request, next: Next) -> Response {
    let key = format!("{} {}", request.method(), request.uri().path());
    tracing::debug!("{}", key);
    state.record_hit(key);
    next.run(request).await
}
