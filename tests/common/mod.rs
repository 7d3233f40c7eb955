#![allow(dead_code)]

use careconnect::AppState;
use careconnect::api::models::Role;
use careconnect::config::Config;
use careconnect::stub::{self, StubServer, StubState};

/// 启动一个带种子数据的桩服务端，并返回指向它的客户端状态
pub async fn stub_app() -> (StubServer, AppState) {
    let seed_config = Config::for_domain("http://127.0.0.1");
    let server = stub::spawn(StubState::seeded(&seed_config).unwrap())
        .await
        .unwrap();
    let state = AppState::new(Config::for_domain(&server.base_url())).unwrap();
    (server, state)
}

pub async fn login(state: &AppState, role: Role) {
    let credentials = match role {
        Role::Admin => state.config.admin.clone(),
        Role::Doctor => state.config.doctor.clone(),
        Role::Patient => state.config.patient.clone(),
    };
    let result = state.api.login(&credentials.email, &credentials.password).await;
    assert!(result.data.is_some(), "login failed: {:?}", result.error);
}

pub fn stub_config() -> Config {
    Config::from_lookup(|key| match key {
        "E2E_STUB_BACKEND" => Some("1".to_string()),
        _ => None,
    })
    .unwrap()
}
