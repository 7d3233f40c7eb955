mod common;

use careconnect::api::models::{Doctor, Me, Role, User};
use careconnect::api::{Delete, List};
use careconnect::app::App;
use careconnect::error::ApiError;
use careconnect::session::SessionState;

#[tokio::test]
async fn requests_without_a_session_never_reach_the_backend() {
    let (server, state) = common::stub_app().await;

    let result = state.api.query(&List::<Doctor>::new(), ()).await;
    assert!(matches!(result.error, Some(ApiError::Unauthorized(_))));
    assert_eq!(server.state.hits("GET /doctors"), 0);
}

#[tokio::test]
async fn bad_credentials_leave_the_user_a_guest() {
    let (_server, state) = common::stub_app().await;

    let result = state.api.login(&state.config.admin.email, "wrong-password").await;
    assert_eq!(
        result.error,
        Some(ApiError::Unauthorized("Invalid email or password".into()))
    );
    assert_eq!(state.session.state(), SessionState::Guest);
    assert!(state.session.token().is_none());
}

#[tokio::test]
async fn roles_are_enforced_by_the_backend() {
    let (server, state) = common::stub_app().await;
    common::login(&state, Role::Patient).await;
    assert_eq!(state.session.state(), SessionState::Patient);

    let users = state.api.query(&List::<User>::new(), ()).await;
    // 病人只能看到自己
    assert_eq!(users.data.map(|u| u.len()), Some(1));

    let deleted = state.api.mutate(&Delete::<Doctor>::new(), 2).await;
    assert!(matches!(deleted.error, Some(ApiError::Forbidden(_))));
    assert!(server.state.tables().get::<Doctor>(2).is_some());
    // 403 不影响会话
    assert_eq!(state.session.state(), SessionState::Patient);
}

#[tokio::test]
async fn rejected_tokens_end_the_session() {
    let (_server, state) = common::stub_app().await;
    state
        .session
        .establish("not-a-signed-token", Some(Role::Doctor), Some(2))
        .await;
    assert_eq!(state.session.state(), SessionState::Doctor);

    let me = state.api.query(&Me, ()).await;
    assert!(matches!(me.error, Some(ApiError::Unauthorized(_))));
    assert_eq!(state.session.state(), SessionState::Guest);
    assert!(state.session.token().is_none());
}

#[tokio::test]
async fn app_follows_login_and_logout() {
    let (_server, state) = common::stub_app().await;
    let mut app = App::launch(state.clone()).await;
    assert_eq!(app.location(), "/");

    app.visit("/admin/dashboard/appointments");
    assert_eq!(app.location(), "/login");

    common::login(&state, Role::Admin).await;
    app.visit("/admin/dashboard/appointments");
    app.settle().await;
    assert_eq!(app.location(), "/admin/dashboard/appointments");
    assert!(!app.screen().select("appointment-row").is_empty());

    app.click("logout-button", 0).await.unwrap();
    assert_eq!(app.location(), "/login");
    assert!(app.screen().contains("Logged out successfully"));
    assert!(state.cache.is_empty());
}
