//! 端点描述符与查询/变更端点的类型契约
//!
//! 每个 REST 操作由一个描述符声明：名称、方法、URL 模板、认证要求，
//! 以及查询提供的标签或变更使之失效的标签。资源的增删改查通过
//! [`Resource`] 统一生成。

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::tags::Tag;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    /// 登录、注册等无需会话
    Public,
    /// 需要 `Authorization: Bearer <token>`
    Bearer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Query,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub name: String,
    pub kind: EndpointKind,
    pub method: HttpMethod,
    pub url_template: String,
    pub auth: AuthRequirement,
    /// 查询：提供的标签；变更：失效的标签
    pub tags: Vec<Tag>,
}

impl EndpointDescriptor {
    pub fn query(name: impl Into<String>, url_template: impl Into<String>, provides: &[Tag]) -> Self {
        Self {
            name: name.into(),
            kind: EndpointKind::Query,
            method: HttpMethod::Get,
            url_template: url_template.into(),
            auth: AuthRequirement::Bearer,
            tags: provides.to_vec(),
        }
    }

    pub fn mutation(
        name: impl Into<String>,
        method: HttpMethod,
        url_template: impl Into<String>,
        invalidates: &[Tag],
    ) -> Self {
        Self {
            name: name.into(),
            kind: EndpointKind::Mutation,
            method,
            url_template: url_template.into(),
            auth: AuthRequirement::Bearer,
            tags: invalidates.to_vec(),
        }
    }

    pub fn public(mut self) -> Self {
        self.auth = AuthRequirement::Public;
        self
    }
}

/// 一次待发送的请求；路径以段保存，由客户端负责编码
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub segments: Vec<String>,
    pub body: Option<Value>,
    pub auth: AuthRequirement,
}

impl ApiRequest {
    pub fn new(descriptor: &EndpointDescriptor, segments: &[&str]) -> Self {
        Self {
            method: descriptor.method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            body: None,
            auth: descriptor.auth,
        }
    }

    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// 未编码的路径，仅用于日志和断言
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

pub trait QueryEndpoint: Send + Sync + 'static {
    type Arg: Serialize + Send + Sync + 'static;
    type Output: DeserializeOwned + Send + 'static;

    fn descriptor(&self) -> EndpointDescriptor;
    fn request(&self, arg: &Self::Arg) -> Result<ApiRequest, ApiError>;
}

pub trait MutationEndpoint: Send + Sync + 'static {
    type Arg: Serialize + Send + Sync + 'static;
    type Output: DeserializeOwned + Send + 'static;

    fn descriptor(&self) -> EndpointDescriptor;
    fn request(&self, arg: &Self::Arg) -> Result<ApiRequest, ApiError>;
}

/// 一类 REST 资源：`/{singular}/register`、`/{plural}`、`/{singular}/:id`
///
/// 同一份描述也被桩服务端用来存取数据。
pub trait Resource: Send + Sync + 'static {
    type Model: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static;
    type Draft: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    type Patch: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static;

    const SINGULAR: &'static str;
    const PLURAL: &'static str;
    const TAG: Tag;

    fn id(model: &Self::Model) -> i64;

    /// 后端为新建记录分配 id 后的完整模型
    fn materialize(id: i64, draft: Self::Draft) -> Self::Model;

    fn apply(model: &mut Self::Model, patch: Self::Patch);

    fn create_invalidates() -> Vec<Tag> {
        vec![Self::TAG]
    }

    fn update_invalidates() -> Vec<Tag> {
        vec![Self::TAG]
    }

    fn delete_invalidates() -> Vec<Tag> {
        vec![Self::TAG]
    }
}

/// 更新请求参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change<P> {
    pub id: i64,
    pub patch: P,
}

/// 删除等无实体返回的确认
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

macro_rules! resource_endpoint {
    ($name:ident) => {
        pub struct $name<R>(PhantomData<fn() -> R>);

        impl<R> $name<R> {
            pub fn new() -> Self {
                Self(PhantomData)
            }
        }

        impl<R> Default for $name<R> {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

resource_endpoint!(List);
resource_endpoint!(Get);
resource_endpoint!(Create);
resource_endpoint!(Update);
resource_endpoint!(Delete);

fn endpoint_name(verb: &str, noun: &str) -> String {
    let mut chars = noun.chars();
    match chars.next() {
        Some(first) => format!("{verb}{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => verb.to_string(),
    }
}

impl<R: Resource> QueryEndpoint for List<R> {
    type Arg = ();
    type Output = Vec<R::Model>;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::query(
            endpoint_name("get", R::PLURAL),
            format!("/{}", R::PLURAL),
            &[R::TAG],
        )
    }

    fn request(&self, _arg: &()) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::new(&self.descriptor(), &[R::PLURAL]))
    }
}

impl<R: Resource> QueryEndpoint for Get<R> {
    type Arg = i64;
    type Output = R::Model;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::query(
            endpoint_name("get", R::SINGULAR),
            format!("/{}/:id", R::SINGULAR),
            &[R::TAG],
        )
    }

    fn request(&self, id: &i64) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::new(
            &self.descriptor(),
            &[R::SINGULAR, id.to_string().as_str()],
        ))
    }
}

impl<R: Resource> MutationEndpoint for Create<R> {
    type Arg = R::Draft;
    type Output = R::Model;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::mutation(
            endpoint_name("create", R::SINGULAR),
            HttpMethod::Post,
            format!("/{}/register", R::SINGULAR),
            &R::create_invalidates(),
        )
    }

    fn request(&self, draft: &R::Draft) -> Result<ApiRequest, ApiError> {
        ApiRequest::new(&self.descriptor(), &[R::SINGULAR, "register"]).with_json(draft)
    }
}

impl<R: Resource> MutationEndpoint for Update<R> {
    type Arg = Change<R::Patch>;
    type Output = R::Model;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::mutation(
            endpoint_name("update", R::SINGULAR),
            HttpMethod::Put,
            format!("/{}/:id", R::SINGULAR),
            &R::update_invalidates(),
        )
    }

    fn request(&self, change: &Change<R::Patch>) -> Result<ApiRequest, ApiError> {
        ApiRequest::new(&self.descriptor(), &[R::SINGULAR, change.id.to_string().as_str()])
            .with_json(&change.patch)
    }
}

impl<R: Resource> MutationEndpoint for Delete<R> {
    type Arg = i64;
    type Output = Acknowledgement;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::mutation(
            endpoint_name("delete", R::SINGULAR),
            HttpMethod::Delete,
            format!("/{}/:id", R::SINGULAR),
            &R::delete_invalidates(),
        )
    }

    fn request(&self, id: &i64) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::new(
            &self.descriptor(),
            &[R::SINGULAR, id.to_string().as_str()],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Doctor;

    #[test]
    fn crud_descriptors_follow_rest_layout() {
        let list = List::<Doctor>::new().descriptor();
        assert_eq!(list.name, "getDoctors");
        assert_eq!(list.url_template, "/doctors");
        assert_eq!(list.kind, EndpointKind::Query);
        assert_eq!(list.tags, vec![Tag::Doctor]);

        let create = Create::<Doctor>::new().descriptor();
        assert_eq!(create.method, HttpMethod::Post);
        assert_eq!(create.url_template, "/doctor/register");

        let delete = Delete::<Doctor>::new().descriptor();
        assert_eq!(delete.method, HttpMethod::Delete);
        assert!(delete.tags.contains(&Tag::Doctor));
    }

    #[test]
    fn request_paths_are_built_from_segments() {
        let request = Get::<Doctor>::new().request(&42).unwrap();
        assert_eq!(request.path(), "/doctor/42");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.auth, AuthRequirement::Bearer);
        assert!(request.body.is_none());
    }

    #[test]
    fn methods_parse_case_insensitively() {
        assert_eq!(HttpMethod::parse("delete"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::parse("PATCH"), None);
    }
}
