//! 页面
//!
//! 每个路由挂载一个 [`Page`]。页面只通过 [`Api`] 读写数据，交互结果以
//! [`Effect`] 交给外层应用处理。

use async_trait::async_trait;

use crate::api::Api;
use crate::api::models::{Appointment, Complaint, Doctor, Payment, Prescription, Service, User};
use crate::router::{LOGIN_ROUTE, SIGNUP_ROUTE, matches_pattern};
use crate::session::SessionState;
use crate::ui::UiError;
use crate::ui::screen::Screen;
use crate::ui::toast::Toast;

pub mod auth;
pub mod dashboard;
pub mod resource;
pub mod views;

pub use auth::{LoginPage, SignupPage};
pub use dashboard::{DashboardPage, DoctorDetailPage, ProfilePage, StaticPage};
pub use resource::{Capabilities, ResourcePage, ResourceView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Toast(Toast),
    Navigate(String),
}

#[async_trait]
pub trait Page: Send {
    fn route(&self) -> &str;

    fn render(&self) -> Screen;

    fn type_into(&mut self, selector: &str, index: usize, value: &str) -> Result<(), UiError>;

    async fn click(&mut self, selector: &str, index: usize) -> Result<Vec<Effect>, UiError>;

    /// 等待页面上的查询不再加载
    async fn settle(&mut self) {}
}

pub(crate) fn no_such_element(selector: &str, index: usize) -> UiError {
    UiError::NoSuchElement {
        selector: selector.to_string(),
        index,
    }
}

/// 为已通过守卫的路由挂载页面
pub fn mount(path: &str, state: SessionState, api: &Api) -> Box<dyn Page> {
    let session = api.session().current();
    let is = |pattern: &str| matches_pattern(pattern, path);

    match path {
        LOGIN_ROUTE => Box::new(LoginPage::new(api.clone())),
        SIGNUP_ROUTE => Box::new(SignupPage::new(api.clone())),
        "/admin/dashboard" | "/doctor/dashboard" | "/patient/dashboard" => {
            Box::new(DashboardPage::new(path, state, api))
        }
        "/admin/dashboard/users" => Box::new(ResourcePage::<User>::new(path, api, session, Capabilities::FULL)),
        "/admin/dashboard/doctors" => Box::new(ResourcePage::<Doctor>::new(path, api, session, Capabilities::FULL)),
        "/admin/dashboard/services" => Box::new(ResourcePage::<Service>::new(path, api, session, Capabilities::FULL)),
        "/admin/dashboard/appointments" => Box::new(ResourcePage::<Appointment>::new(
            path,
            api,
            session,
            Capabilities::MANAGE,
        )),
        "/admin/dashboard/prescriptions" => Box::new(ResourcePage::<Prescription>::new(
            path,
            api,
            session,
            Capabilities::REMOVE_ONLY,
        )),
        "/admin/dashboard/complaints" => Box::new(ResourcePage::<Complaint>::new(
            path,
            api,
            session,
            Capabilities::MANAGE,
        )),
        "/admin/dashboard/payments" => Box::new(ResourcePage::<Payment>::new(
            path,
            api,
            session,
            Capabilities::READ_ONLY,
        )),
        "/doctor/dashboard/appointments" => Box::new(ResourcePage::<Appointment>::new(
            path,
            api,
            session,
            Capabilities::EDIT_ONLY,
        )),
        "/doctor/dashboard/prescriptions" => Box::new(ResourcePage::<Prescription>::new(
            path,
            api,
            session,
            Capabilities::FULL,
        )),
        "/patient/dashboard/doctors" => Box::new(ResourcePage::<Doctor>::new(
            path,
            api,
            session,
            Capabilities::READ_ONLY,
        )),
        "/patient/dashboard/appointments" => Box::new(ResourcePage::<Appointment>::new(
            path,
            api,
            session,
            Capabilities::BOOK,
        )),
        "/patient/dashboard/prescriptions" => Box::new(ResourcePage::<Prescription>::new(
            path,
            api,
            session,
            Capabilities::READ_ONLY,
        )),
        "/patient/dashboard/complaints" => Box::new(ResourcePage::<Complaint>::new(
            path,
            api,
            session,
            Capabilities::CREATE_ONLY,
        )),
        "/patient/dashboard/payments" => Box::new(ResourcePage::<Payment>::new(
            path,
            api,
            session,
            Capabilities::CREATE_ONLY,
        )),
        _ if is("/:role/dashboard/profile") => Box::new(ProfilePage::new(path, api)),
        _ if is("/admin/dashboard/doctors/:id") => Box::new(DoctorDetailPage::new(path, api)),
        _ => Box::new(StaticPage::new(path)),
    }
}
