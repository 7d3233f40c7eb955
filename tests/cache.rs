mod common;

use careconnect::api::models::{
    Appointment, AppointmentPatch, AppointmentStatus, Doctor, Role, Service, ServiceByTitle,
};
use careconnect::AppState;
use careconnect::api::{Change, Get, HttpMethod, Interceptor, List, Update};
use careconnect::cache::QueryStatus;
use careconnect::error::ApiError;
use serde_json::json;

#[tokio::test]
async fn concurrent_queries_share_one_request() {
    let (server, state) = common::stub_app().await;
    common::login(&state, Role::Patient).await;

    let doctors = List::<Doctor>::new();
    let (first, second) = tokio::join!(
        state.api.query(&doctors, ()),
        state.api.query(&doctors, ())
    );

    assert_eq!(first.status, QueryStatus::Success);
    assert_eq!(first.data, second.data);
    assert_eq!(server.state.hits("GET /doctors"), 1);

    // 新鲜数据直接来自缓存
    state.api.query(&doctors, ()).await;
    assert_eq!(server.state.hits("GET /doctors"), 1);
}

#[tokio::test]
async fn updates_invalidate_every_query_with_the_tag() {
    let (server, state) = common::stub_app().await;
    common::login(&state, Role::Admin).await;

    let list = List::<Appointment>::new();
    let one = Get::<Appointment>::new();
    let mut subscription = state.api.subscribe(&list, ());
    subscription.settled().await;
    state.api.query(&one, 10).await;
    assert_eq!(server.state.hits("GET /appointments"), 1);
    assert_eq!(server.state.hits("GET /appointment/10"), 1);

    let patch = AppointmentPatch {
        status: Some(AppointmentStatus::Confirmed),
        ..AppointmentPatch::default()
    };
    let updated = state
        .api
        .mutate(&Update::<Appointment>::new(), Change { id: 10, patch })
        .await;
    assert_eq!(updated.data.map(|a| a.status), Some(AppointmentStatus::Confirmed));

    // 订阅中的列表立即重新请求
    let list_result = subscription.settled_after(2).await;
    assert_eq!(server.state.hits("GET /appointments"), 2);
    let refreshed = list_result.data.unwrap();
    assert_eq!(
        refreshed.iter().find(|a| a.id == 10).map(|a| a.status),
        Some(AppointmentStatus::Confirmed)
    );

    // 无人订阅的条目只被标记为过期，下次调用时再请求
    assert_eq!(server.state.hits("GET /appointment/10"), 1);
    let single = state.api.query(&one, 10).await;
    assert_eq!(server.state.hits("GET /appointment/10"), 2);
    assert_eq!(single.data.map(|a| a.status), Some(AppointmentStatus::Confirmed));
}

#[tokio::test]
async fn one_mutation_refetches_each_active_query_once() {
    let (server, state) = common::stub_app().await;
    common::login(&state, Role::Admin).await;

    let mut list = state.api.subscribe(&List::<Appointment>::new(), ());
    let mut one = state.api.subscribe(&Get::<Appointment>::new(), 10);
    list.settled().await;
    one.settled().await;
    assert_eq!((list.fetches(), one.fetches()), (1, 1));

    let patch = AppointmentPatch {
        amount: Some(7500.0),
        ..AppointmentPatch::default()
    };
    let updated = state
        .api
        .mutate(&Update::<Appointment>::new(), Change { id: 10, patch })
        .await;
    assert_eq!(updated.data.map(|a| a.amount), Some(7500.0));

    let list_result = list.settled_after(2).await;
    let one_result = one.settled_after(2).await;
    assert_eq!(list.fetches(), 2);
    assert_eq!(one.fetches(), 2);
    assert_eq!(server.state.hits("GET /appointments"), 2);
    assert_eq!(server.state.hits("GET /appointment/10"), 2);

    let listed = list_result.data.unwrap();
    assert_eq!(
        listed.iter().find(|a| a.id == 10).map(|a| a.amount),
        Some(7500.0)
    );
    assert_eq!(one_result.data.map(|a| a.amount), Some(7500.0));

    // 没有多余的重新请求
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(server.state.hits("GET /appointments"), 2);
    assert_eq!(server.state.hits("GET /appointment/10"), 2);
}

#[tokio::test]
async fn failed_refetch_keeps_last_known_data() {
    let (_server, state) = common::stub_app().await;
    let interceptor = Interceptor::new();
    let state = AppState::with_interceptor(state.config.clone(), interceptor.clone()).unwrap();
    common::login(&state, Role::Admin).await;

    let services = List::<Service>::new();
    let first = state.api.query(&services, ()).await;
    assert_eq!(first.data.as_ref().map(Vec::len), Some(3));

    interceptor
        .stub(
            "services",
            HttpMethod::Get,
            "**/services",
            500,
            json!({ "message": "Database unavailable" }),
        )
        .unwrap();
    let second = state.api.refetch(&services, ()).await;
    assert_eq!(second.status, QueryStatus::Error);
    assert!(matches!(second.error, Some(ApiError::Server { status: 500, .. })));
    assert_eq!(second.data.map(|s| s.len()), Some(3));
    assert_eq!(interceptor.calls("services").len(), 1);
}

#[tokio::test]
async fn services_can_be_found_by_title() {
    let (_server, state) = common::stub_app().await;
    common::login(&state, Role::Patient).await;

    let found = state.api.query(&ServiceByTitle, "Eye Care".to_string()).await;
    assert_eq!(found.data.map(|s| s.id), Some(9));

    let missing = state.api.query(&ServiceByTitle, "Astrology".to_string()).await;
    assert_eq!(missing.status, QueryStatus::Error);
    assert!(matches!(missing.error, Some(ApiError::NotFound(_))));
}

#[tokio::test]
async fn logout_clears_cached_queries() {
    let (_server, state) = common::stub_app().await;
    common::login(&state, Role::Patient).await;

    state.api.query(&List::<Doctor>::new(), ()).await;
    assert!(!state.cache.is_empty());

    state.api.logout().await;
    assert!(state.cache.is_empty());
    assert!(state.session.state().is_guest());
}
