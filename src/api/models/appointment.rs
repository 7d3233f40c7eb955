use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::endpoint::Resource;
use crate::api::tags::Tag;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Pending" => Some(AppointmentStatus::Pending),
            "Confirmed" => Some(AppointmentStatus::Confirmed),
            "Cancelled" => Some(AppointmentStatus::Cancelled),
            "Completed" => Some(AppointmentStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Resource for Appointment {
    type Model = Appointment;
    type Draft = AppointmentDraft;
    type Patch = AppointmentPatch;

    const SINGULAR: &'static str = "appointment";
    const PLURAL: &'static str = "appointments";
    const TAG: Tag = Tag::Appointment;

    fn id(model: &Appointment) -> i64 {
        model.id
    }

    fn materialize(id: i64, draft: AppointmentDraft) -> Appointment {
        Appointment {
            id,
            patient_id: draft.patient_id,
            doctor_id: draft.doctor_id,
            date: draft.date,
            time: draft.time,
            status: AppointmentStatus::Pending,
            amount: draft.amount,
        }
    }

    fn apply(model: &mut Appointment, patch: AppointmentPatch) {
        if let Some(date) = patch.date {
            model.date = date;
        }
        if let Some(time) = patch.time {
            model.time = time;
        }
        if let Some(status) = patch.status {
            model.status = status;
        }
        if let Some(amount) = patch.amount {
            model.amount = amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_plain_date_and_time() {
        let appointment = Appointment {
            id: 7,
            patient_id: 3,
            doctor_id: 2,
            date: NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            status: AppointmentStatus::Confirmed,
            amount: 7500.0,
        };
        let json = serde_json::to_value(&appointment).unwrap();
        assert_eq!(json["date"], "2025-08-15");
        assert_eq!(json["time"], "10:00:00");
        assert_eq!(json["status"], "Confirmed");
        assert_eq!(json["patientId"], 3);
    }
}
