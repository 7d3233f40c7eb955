//! 流程注册表

use futures_util::future::BoxFuture;

use crate::harness::{Driver, HarnessError};

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod patient;

pub type FlowFuture<'a> = BoxFuture<'a, Result<(), HarnessError>>;

#[derive(Clone, Copy)]
pub struct Flow {
    pub name: &'static str,
    pub run: for<'a> fn(&'a mut Driver) -> FlowFuture<'a>,
}

macro_rules! flow {
    ($module:ident :: $name:ident) => {
        Flow {
            name: concat!(stringify!($module), "::", stringify!($name)),
            run: |driver| Box::pin($module::$name(driver)),
        }
    };
}

pub fn all_flows() -> Vec<Flow> {
    vec![
        flow!(auth::admin_login_lands_on_dashboard),
        flow!(auth::invalid_credentials_show_an_error),
        flow!(auth::signup_rejects_mismatched_passwords),
        flow!(auth::signup_registers_a_new_patient),
        flow!(auth::logout_returns_to_login),
        flow!(auth::patient_cannot_open_admin_routes),
        flow!(auth::expired_session_returns_to_login),
        flow!(admin::admin_views_appointments_without_redirect),
        flow!(admin::admin_updates_an_appointment),
        flow!(admin::admin_searches_doctors),
        flow!(admin::admin_deletes_a_doctor),
        flow!(admin::admin_creates_and_removes_a_service),
        flow!(admin::admin_resolves_a_complaint),
        flow!(doctor::doctor_completes_an_appointment),
        flow!(doctor::doctor_writes_a_prescription),
        flow!(doctor::doctor_cannot_manage_users),
        flow!(patient::patient_browses_doctors),
        flow!(patient::patient_books_an_appointment),
        flow!(patient::booking_errors_stay_inline),
        flow!(patient::patient_pays_through_stubbed_gateway),
        flow!(patient::patient_files_a_complaint),
        flow!(patient::patient_views_profile),
    ]
}

/// 名称包含 `filter` 的流程
pub fn matching(filter: Option<&str>) -> Vec<Flow> {
    all_flows()
        .into_iter()
        .filter(|flow| filter.is_none_or(|needle| flow.name.contains(needle)))
        .collect()
}

/// 数据唯一后缀，可重复运行
pub(crate) fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
