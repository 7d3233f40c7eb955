use serde::{Deserialize, Serialize};

use crate::api::endpoint::Resource;
use crate::api::tags::Tag;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

impl ComplaintStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Open" => Some(ComplaintStatus::Open),
            "InProgress" | "In Progress" => Some(ComplaintStatus::InProgress),
            "Resolved" => Some(ComplaintStatus::Resolved),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Open => "Open",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub status: ComplaintStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintDraft {
    pub user_id: i64,
    pub subject: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ComplaintStatus>,
}

impl Resource for Complaint {
    type Model = Complaint;
    type Draft = ComplaintDraft;
    type Patch = ComplaintPatch;

    const SINGULAR: &'static str = "complaint";
    const PLURAL: &'static str = "complaints";
    const TAG: Tag = Tag::Complaint;

    fn id(model: &Complaint) -> i64 {
        model.id
    }

    fn materialize(id: i64, draft: ComplaintDraft) -> Complaint {
        Complaint {
            id,
            user_id: draft.user_id,
            subject: draft.subject,
            description: draft.description,
            status: ComplaintStatus::Open,
        }
    }

    fn apply(model: &mut Complaint, patch: ComplaintPatch) {
        if let Some(description) = patch.description {
            model.description = description;
        }
        if let Some(status) = patch.status {
            model.status = status;
        }
    }
}
