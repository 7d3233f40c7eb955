use serde::{Deserialize, Serialize};

use crate::api::endpoint::{ApiRequest, EndpointDescriptor, HttpMethod, MutationEndpoint, QueryEndpoint};
use crate::api::models::user::{Role, User};
use crate::api::tags::Tag;
use crate::error::ApiError;

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    /// 部分部署只在顶层返回角色
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl LoginResponse {
    pub fn role(&self) -> Role {
        self.role.unwrap_or(self.user.role)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /user/login`
#[derive(Debug, Default, Clone, Copy)]
pub struct Login;

impl MutationEndpoint for Login {
    type Arg = LoginRequest;
    type Output = LoginResponse;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::mutation("login", HttpMethod::Post, "/user/login", &[]).public()
    }

    fn request(&self, body: &LoginRequest) -> Result<ApiRequest, ApiError> {
        ApiRequest::new(&self.descriptor(), &["user", "login"]).with_json(body)
    }
}

/// `POST /user/register`，患者自助注册
#[derive(Debug, Default, Clone, Copy)]
pub struct Register;

impl MutationEndpoint for Register {
    type Arg = RegisterRequest;
    type Output = RegisterResponse;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::mutation("register", HttpMethod::Post, "/user/register", &[Tag::User])
            .public()
    }

    fn request(&self, body: &RegisterRequest) -> Result<ApiRequest, ApiError> {
        ApiRequest::new(&self.descriptor(), &["user", "register"]).with_json(body)
    }
}

/// `GET /user/me`
#[derive(Debug, Default, Clone, Copy)]
pub struct Me;

impl QueryEndpoint for Me {
    type Arg = ();
    type Output = User;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::query("getMe", "/user/me", &[Tag::User])
    }

    fn request(&self, _arg: &()) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::new(&self.descriptor(), &["user", "me"]))
    }
}
