use serde::{Deserialize, Serialize};

use crate::api::endpoint::Resource;
use crate::api::tags::Tag;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub appointment_id: i64,
    pub amount: f64,
    pub method: String,
    #[serde(default)]
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub appointment_id: i64,
    pub amount: f64,
    pub method: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
}

impl Resource for Payment {
    type Model = Payment;
    type Draft = PaymentDraft;
    type Patch = PaymentPatch;

    const SINGULAR: &'static str = "payment";
    const PLURAL: &'static str = "payments";
    const TAG: Tag = Tag::Payment;

    fn id(model: &Payment) -> i64 {
        model.id
    }

    fn materialize(id: i64, draft: PaymentDraft) -> Payment {
        Payment {
            id,
            appointment_id: draft.appointment_id,
            amount: draft.amount,
            method: draft.method,
            status: PaymentStatus::Paid,
        }
    }

    fn apply(model: &mut Payment, patch: PaymentPatch) {
        if let Some(status) = patch.status {
            model.status = status;
        }
    }

    // 付款成功后预约状态由后端更新
    fn create_invalidates() -> Vec<Tag> {
        vec![Tag::Payment, Tag::Appointment]
    }
}
