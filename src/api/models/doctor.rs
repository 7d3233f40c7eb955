use serde::{Deserialize, Serialize};

use crate::api::endpoint::Resource;
use crate::api::tags::Tag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub specialization: String,
    pub experience_years: u32,
    pub fee: f64,
    #[serde(default = "available_by_default")]
    pub available: bool,
}

fn available_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDraft {
    pub full_name: String,
    pub email: String,
    pub specialization: String,
    pub experience_years: u32,
    pub fee: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Resource for Doctor {
    type Model = Doctor;
    type Draft = DoctorDraft;
    type Patch = DoctorPatch;

    const SINGULAR: &'static str = "doctor";
    const PLURAL: &'static str = "doctors";
    const TAG: Tag = Tag::Doctor;

    fn id(model: &Doctor) -> i64 {
        model.id
    }

    fn materialize(id: i64, draft: DoctorDraft) -> Doctor {
        Doctor {
            id,
            full_name: draft.full_name,
            email: draft.email,
            specialization: draft.specialization,
            experience_years: draft.experience_years,
            fee: draft.fee,
            available: true,
        }
    }

    fn apply(model: &mut Doctor, patch: DoctorPatch) {
        if let Some(full_name) = patch.full_name {
            model.full_name = full_name;
        }
        if let Some(specialization) = patch.specialization {
            model.specialization = specialization;
        }
        if let Some(experience_years) = patch.experience_years {
            model.experience_years = experience_years;
        }
        if let Some(fee) = patch.fee {
            model.fee = fee;
        }
        if let Some(available) = patch.available {
            model.available = available;
        }
    }

    // 医生被删除后其预约列表随之变化
    fn delete_invalidates() -> Vec<Tag> {
        vec![Tag::Doctor, Tag::Appointment]
    }
}
