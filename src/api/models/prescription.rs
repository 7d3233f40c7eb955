use serde::{Deserialize, Serialize};

use crate::api::endpoint::Resource;
use crate::api::tags::Tag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: i64,
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub medicine: String,
    pub dosage: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDraft {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub medicine: String,
    pub dosage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medicine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Resource for Prescription {
    type Model = Prescription;
    type Draft = PrescriptionDraft;
    type Patch = PrescriptionPatch;

    const SINGULAR: &'static str = "prescription";
    const PLURAL: &'static str = "prescriptions";
    const TAG: Tag = Tag::Prescription;

    fn id(model: &Prescription) -> i64 {
        model.id
    }

    fn materialize(id: i64, draft: PrescriptionDraft) -> Prescription {
        Prescription {
            id,
            appointment_id: draft.appointment_id,
            patient_id: draft.patient_id,
            doctor_id: draft.doctor_id,
            medicine: draft.medicine,
            dosage: draft.dosage,
            notes: draft.notes,
        }
    }

    fn apply(model: &mut Prescription, patch: PrescriptionPatch) {
        if let Some(medicine) = patch.medicine {
            model.medicine = medicine;
        }
        if let Some(dosage) = patch.dosage {
            model.dosage = dosage;
        }
        if patch.notes.is_some() {
            model.notes = patch.notes;
        }
    }
}
