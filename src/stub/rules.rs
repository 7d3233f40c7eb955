//! 桩服务端的业务规则：谁能读写哪些记录，以及写入前的校验

use crate::api::Resource;
use crate::api::models::{
    Appointment, AppointmentDraft, AppointmentPatch, AppointmentStatus, Complaint, Doctor,
    DoctorDraft, Payment, PaymentDraft, Prescription, PrescriptionDraft, Role, Service,
    ServiceDraft, ServicePatch, User,
};
use crate::error::ErrorBody;
use crate::stub::state::Tables;
use crate::utils::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Update,
    Delete,
}

pub trait StubResource: Resource {
    fn permits(role: Role, _verb: Verb) -> bool {
        role == Role::Admin
    }

    fn visible_to(_tables: &Tables, _model: &Self::Model, _claims: &Claims) -> bool {
        true
    }

    fn check_draft(_tables: &Tables, _draft: &Self::Draft) -> Result<(), ErrorBody> {
        Ok(())
    }

    fn check_patch(_patch: &Self::Patch) -> Result<(), ErrorBody> {
        Ok(())
    }

    fn after_create(_tables: &mut Tables, _model: &Self::Model) {}

    fn after_delete(_tables: &mut Tables, _id: i64) {}
}

fn require_positive(amount: f64) -> Result<(), ErrorBody> {
    if amount <= 0.0 {
        return Err(ErrorBody::new("Invalid amount").with_field("amount", "Amount must be greater than zero"));
    }
    Ok(())
}

fn owns(claims: &Claims, user_id: i64) -> bool {
    claims.user_id() == Some(user_id)
}

impl StubResource for Service {
    fn check_draft(tables: &Tables, draft: &ServiceDraft) -> Result<(), ErrorBody> {
        if draft.title.trim().is_empty() {
            return Err(ErrorBody::new("Invalid service").with_field("title", "Title is required"));
        }
        if draft.price < 0.0 {
            return Err(ErrorBody::new("Invalid service").with_field("price", "Price cannot be negative"));
        }
        let taken = tables
            .list::<Service>()
            .iter()
            .any(|service| service.title.eq_ignore_ascii_case(draft.title.trim()));
        if taken {
            return Err(ErrorBody::new("Invalid service")
                .with_field("title", "A service with this title already exists"));
        }
        Ok(())
    }

    fn check_patch(patch: &ServicePatch) -> Result<(), ErrorBody> {
        match patch.price {
            Some(price) if price < 0.0 => {
                Err(ErrorBody::new("Invalid service").with_field("price", "Price cannot be negative"))
            }
            _ => Ok(()),
        }
    }
}

impl StubResource for User {
    fn visible_to(_tables: &Tables, model: &User, claims: &Claims) -> bool {
        claims.role == Role::Admin || owns(claims, model.id)
    }

    fn after_delete(tables: &mut Tables, id: i64) {
        tables.remove_accounts_of(id);
        tables.remove::<Doctor>(id);
        tables.remove_where::<Appointment>(|a| a.patient_id == id || a.doctor_id == id);
    }
}

impl StubResource for Doctor {
    fn check_draft(tables: &Tables, draft: &DoctorDraft) -> Result<(), ErrorBody> {
        if !draft.email.contains('@') {
            return Err(ErrorBody::new("Invalid doctor").with_field("email", "Please enter a valid email"));
        }
        let taken = tables
            .list::<Doctor>()
            .iter()
            .any(|doctor| doctor.email.eq_ignore_ascii_case(draft.email.trim()));
        if taken {
            return Err(ErrorBody::new("Invalid doctor")
                .with_field("email", "A doctor with this email already exists"));
        }
        if draft.fee < 0.0 {
            return Err(ErrorBody::new("Invalid doctor").with_field("fee", "Fee cannot be negative"));
        }
        Ok(())
    }

    fn after_delete(tables: &mut Tables, id: i64) {
        let removed = tables.remove_where::<Appointment>(|a| a.doctor_id == id);
        tracing::debug!("Removed {} appointments of deleted doctor {}", removed, id);
    }
}

impl StubResource for Appointment {
    fn permits(role: Role, verb: Verb) -> bool {
        match verb {
            Verb::Create => matches!(role, Role::Admin | Role::Patient),
            Verb::Update => matches!(role, Role::Admin | Role::Doctor),
            Verb::Delete => matches!(role, Role::Admin | Role::Patient),
        }
    }

    fn visible_to(_tables: &Tables, model: &Appointment, claims: &Claims) -> bool {
        match claims.role {
            Role::Admin => true,
            Role::Doctor => owns(claims, model.doctor_id),
            Role::Patient => owns(claims, model.patient_id),
        }
    }

    fn check_draft(tables: &Tables, draft: &AppointmentDraft) -> Result<(), ErrorBody> {
        if tables.get::<Doctor>(draft.doctor_id).is_none() {
            return Err(ErrorBody::new("Invalid appointment").with_field("doctorId", "Doctor does not exist"));
        }
        require_positive(draft.amount)
    }

    fn check_patch(patch: &AppointmentPatch) -> Result<(), ErrorBody> {
        match patch.amount {
            Some(amount) => require_positive(amount),
            None => Ok(()),
        }
    }
}

impl StubResource for Prescription {
    fn permits(role: Role, _verb: Verb) -> bool {
        matches!(role, Role::Admin | Role::Doctor)
    }

    fn visible_to(_tables: &Tables, model: &Prescription, claims: &Claims) -> bool {
        match claims.role {
            Role::Admin => true,
            Role::Doctor => owns(claims, model.doctor_id),
            Role::Patient => owns(claims, model.patient_id),
        }
    }

    fn check_draft(tables: &Tables, draft: &PrescriptionDraft) -> Result<(), ErrorBody> {
        if tables.get::<Appointment>(draft.appointment_id).is_none() {
            return Err(ErrorBody::new("Invalid prescription")
                .with_field("appointmentId", "Appointment does not exist"));
        }
        Ok(())
    }
}

impl StubResource for Complaint {
    fn permits(role: Role, verb: Verb) -> bool {
        verb == Verb::Create || role == Role::Admin
    }

    fn visible_to(_tables: &Tables, model: &Complaint, claims: &Claims) -> bool {
        claims.role == Role::Admin || owns(claims, model.user_id)
    }
}

impl StubResource for Payment {
    fn permits(role: Role, verb: Verb) -> bool {
        match verb {
            Verb::Create => matches!(role, Role::Admin | Role::Patient),
            Verb::Update | Verb::Delete => role == Role::Admin,
        }
    }

    fn visible_to(tables: &Tables, model: &Payment, claims: &Claims) -> bool {
        match claims.role {
            Role::Admin => true,
            _ => tables
                .get::<Appointment>(model.appointment_id)
                .is_some_and(|a| owns(claims, a.patient_id) || owns(claims, a.doctor_id)),
        }
    }

    fn check_draft(tables: &Tables, draft: &PaymentDraft) -> Result<(), ErrorBody> {
        if tables.get::<Appointment>(draft.appointment_id).is_none() {
            return Err(ErrorBody::new("Invalid payment")
                .with_field("appointmentId", "Appointment does not exist"));
        }
        require_positive(draft.amount)
    }

    /// 付款后预约转为已确认
    fn after_create(tables: &mut Tables, model: &Payment) {
        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Confirmed),
            ..AppointmentPatch::default()
        };
        tables.update::<Appointment>(model.appointment_id, patch);
    }
}
