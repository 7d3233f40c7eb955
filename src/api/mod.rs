// API 层
// 端点描述符、资源模型、HTTP 客户端与带缓存的调用入口

pub mod client;
pub mod endpoint;
pub mod intercept;
pub mod models;
pub mod operations;
pub mod registry;
pub mod tags;

pub use client::ApiClient;
pub use endpoint::{
    Acknowledgement, ApiRequest, AuthRequirement, Change, Create, Delete, EndpointDescriptor,
    EndpointKind, Get, HttpMethod, List, MutationEndpoint, QueryEndpoint, Resource, Update,
};
pub use intercept::{InterceptedCall, Interceptor};
pub use operations::{Api, QuerySubscription};
pub use registry::EndpointSet;
pub use tags::Tag;
