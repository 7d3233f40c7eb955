//! 进程内桩服务端
//!
//! 以内存数据实现与真实后端相同的 REST 接口，端到端流程可以在没有
//! 部署环境时运行。

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;

use crate::api::models::{Appointment, Complaint, Doctor, Payment, Prescription, Service, User};

pub mod handlers;
pub mod middleware;
pub mod rules;
pub mod state;

use middleware::{auth_middleware, log_errors, record_hits};
use rules::StubResource;
pub use state::{SeedError, StubState};

/// 一类资源的 REST 路由
fn resource_routes<R: StubResource>(with_create: bool) -> Router<StubState> {
    let router = Router::new()
        .route(&format!("/{}", R::PLURAL), get(handlers::list::<R>))
        .route(
            &format!("/{}/{{id}}", R::SINGULAR),
            get(handlers::get_one::<R>)
                .put(handlers::update::<R>)
                .delete(handlers::delete::<R>),
        );
    if with_create {
        router.route(
            &format!("/{}/register", R::SINGULAR),
            post(handlers::create::<R>),
        )
    } else {
        router
    }
}

pub fn router(state: StubState) -> Router {
    let public_routes = Router::new()
        .route("/user/login", post(handlers::login))
        // 用户的创建也走这里，管理员令牌由处理函数自行识别
        .route("/user/register", post(handlers::register));

    let protected_routes = Router::new()
        .route("/user/me", get(handlers::me))
        .route("/service/title/{title}", get(handlers::service_by_title))
        .merge(resource_routes::<Service>(true))
        .merge(resource_routes::<User>(false))
        .merge(resource_routes::<Doctor>(true))
        .merge(resource_routes::<Appointment>(true))
        .merge(resource_routes::<Prescription>(true))
        .merge(resource_routes::<Complaint>(true))
        .merge(resource_routes::<Payment>(true))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(state.clone(), record_hits))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 运行中的桩服务端；丢弃即停止
pub struct StubServer {
    pub addr: SocketAddr,
    pub state: StubState,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 在随机端口上启动
pub async fn spawn(state: StubState) -> std::io::Result<StubServer> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    let app = router(state.clone());

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Stub backend stopped: {}", e);
        }
    });
    tracing::info!("Stub backend listening on {}", addr);

    Ok(StubServer {
        addr,
        state,
        handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DEFAULT_PASSWORD, DEFAULT_PATIENT_EMAIL};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> (Router, StubState) {
        let state = StubState::seeded(&Config::for_domain("http://localhost")).unwrap();
        (router(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn patient_token(app: &Router) -> String {
        let request = Request::post("/user/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "email": DEFAULT_PATIENT_EMAIL, "password": DEFAULT_PASSWORD }).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn protected_routes_require_a_bearer_token() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/doctors").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn patients_cannot_delete_doctors() {
        let (app, state) = app();
        let token = patient_token(&app).await;

        let request = Request::delete("/doctor/2")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(state.hits("DELETE /doctor/2"), 1);
        assert!(state.tables().get::<Doctor>(2).is_some());
    }

    #[tokio::test]
    async fn patients_only_see_their_own_appointments() {
        let (app, _) = app();
        let token = patient_token(&app).await;

        let request = Request::get("/appointments")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let appointments = body_json(response).await;
        let appointments = appointments.as_array().unwrap();
        assert_eq!(appointments.len(), 2);
        assert!(appointments.iter().all(|a| a["patientId"] == json!(3)));
    }
}
