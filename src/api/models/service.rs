use serde::{Deserialize, Serialize};

use crate::api::endpoint::{ApiRequest, EndpointDescriptor, QueryEndpoint, Resource};
use crate::api::tags::Tag;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Resource for Service {
    type Model = Service;
    type Draft = ServiceDraft;
    type Patch = ServicePatch;

    const SINGULAR: &'static str = "service";
    const PLURAL: &'static str = "services";
    const TAG: Tag = Tag::Service;

    fn id(model: &Service) -> i64 {
        model.id
    }

    fn materialize(id: i64, draft: ServiceDraft) -> Service {
        Service {
            id,
            title: draft.title,
            description: draft.description,
            price: draft.price,
        }
    }

    fn apply(model: &mut Service, patch: ServicePatch) {
        if let Some(title) = patch.title {
            model.title = title;
        }
        if let Some(description) = patch.description {
            model.description = description;
        }
        if let Some(price) = patch.price {
            model.price = price;
        }
    }
}

/// 按标题查找服务：`GET /service/title/:title`
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceByTitle;

impl QueryEndpoint for ServiceByTitle {
    type Arg = String;
    type Output = Service;

    fn descriptor(&self) -> EndpointDescriptor {
        EndpointDescriptor::query("getServiceByTitle", "/service/title/:title", &[Tag::Service])
    }

    fn request(&self, title: &String) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::new(
            &self.descriptor(),
            &["service", "title", title.as_str()],
        ))
    }
}
