// 各资源的列表展示与表单映射

use crate::api::models::{
    Appointment, AppointmentDraft, AppointmentPatch, AppointmentStatus, Complaint, ComplaintDraft,
    ComplaintPatch, ComplaintStatus, Doctor, DoctorDraft, DoctorPatch, Payment, PaymentDraft,
    PaymentPatch, PaymentStatus, Prescription, PrescriptionDraft, PrescriptionPatch, Role, Service,
    ServiceDraft, ServicePatch, User, UserDraft, UserPatch,
};
use crate::session::Session;
use crate::ui::form::Form;
use crate::ui::pages::resource::ResourceView;

/// 当前登录用户的 id；没有时记录表单错误
fn signed_in_user(form: &mut Form, session: &Session) -> Option<i64> {
    if session.user_id.is_none() {
        form.reject("session", "You must be signed in to do this");
    }
    session.user_id
}

fn positive_amount(form: &mut Form, field: &str, amount: Option<f64>) -> Option<f64> {
    match amount {
        Some(value) if value <= 0.0 => {
            form.reject(field, "Amount must be greater than zero");
            None
        }
        other => other,
    }
}

impl ResourceView for Service {
    const LABEL: &'static str = "Service";

    fn title(&self) -> String {
        self.title.clone()
    }

    fn summary(&self) -> String {
        format!("{} | ${:.2} | {}", self.title, self.price, self.description)
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    fn create_fields() -> &'static [&'static str] {
        &["title", "description", "price"]
    }

    fn draft_from_form(form: &mut Form, _session: &Session) -> Option<ServiceDraft> {
        let title = form.required("title", "Title");
        let description = form.required("description", "Description");
        let price = form.parse::<f64>("price", "Price");
        Some(ServiceDraft {
            title: title?,
            description: description?,
            price: price?,
        })
    }

    fn edit_form(&self) -> Form {
        Form::prefilled(&[
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("price", self.price.to_string()),
        ])
    }

    fn patch_from_form(form: &mut Form) -> Option<ServicePatch> {
        Some(ServicePatch {
            title: form.optional("title"),
            description: form.optional("description"),
            price: form.parse_optional("price", "Price"),
        })
    }
}

impl ResourceView for User {
    const LABEL: &'static str = "User";

    fn title(&self) -> String {
        self.full_name.clone()
    }

    fn summary(&self) -> String {
        format!("{} | {} | {}", self.full_name, self.email, self.role)
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.full_name, self.email)
    }

    fn create_fields() -> &'static [&'static str] {
        &["full-name", "email", "password", "role", "phone"]
    }

    fn draft_from_form(form: &mut Form, _session: &Session) -> Option<UserDraft> {
        let full_name = form.required("full-name", "Full name");
        let email = form.required("email", "Email");
        let password = form.required("password", "Password");
        let role = match form.optional("role") {
            None => Some(Role::Patient),
            Some(raw) => {
                let role = Role::parse(&raw);
                if role.is_none() {
                    form.reject("role", "Role must be admin, doctor or patient");
                }
                role
            }
        };
        Some(UserDraft {
            full_name: full_name?,
            email: email?,
            password: password?,
            role: role?,
            phone: form.optional("phone"),
        })
    }

    fn edit_form(&self) -> Form {
        Form::prefilled(&[
            ("full-name", self.full_name.clone()),
            ("phone", self.phone.clone().unwrap_or_default()),
            ("role", self.role.as_str().to_string()),
        ])
    }

    fn patch_from_form(form: &mut Form) -> Option<UserPatch> {
        let role = match form.optional("role") {
            Some(raw) => match Role::parse(&raw) {
                Some(role) => Some(role),
                None => {
                    form.reject("role", "Role must be admin, doctor or patient");
                    return None;
                }
            },
            None => None,
        };
        Some(UserPatch {
            full_name: form.optional("full-name"),
            phone: form.optional("phone"),
            role,
        })
    }
}

impl ResourceView for Doctor {
    const LABEL: &'static str = "Doctor";

    fn title(&self) -> String {
        self.full_name.clone()
    }

    fn summary(&self) -> String {
        format!(
            "{} | {} | {} years | ${:.2} | {}",
            self.full_name,
            self.specialization,
            self.experience_years,
            self.fee,
            if self.available { "Available" } else { "Unavailable" }
        )
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.full_name, self.specialization)
    }

    fn create_fields() -> &'static [&'static str] {
        &["full-name", "email", "specialization", "experience", "fee"]
    }

    fn draft_from_form(form: &mut Form, _session: &Session) -> Option<DoctorDraft> {
        let full_name = form.required("full-name", "Full name");
        let email = form.required("email", "Email");
        let specialization = form.required("specialization", "Specialization");
        let experience_years = form.parse::<u32>("experience", "Experience");
        let fee = form.parse::<f64>("fee", "Fee");
        Some(DoctorDraft {
            full_name: full_name?,
            email: email?,
            specialization: specialization?,
            experience_years: experience_years?,
            fee: fee?,
        })
    }

    fn edit_form(&self) -> Form {
        Form::prefilled(&[
            ("full-name", self.full_name.clone()),
            ("specialization", self.specialization.clone()),
            ("experience", self.experience_years.to_string()),
            ("fee", self.fee.to_string()),
            ("available", self.available.to_string()),
        ])
    }

    fn patch_from_form(form: &mut Form) -> Option<DoctorPatch> {
        Some(DoctorPatch {
            full_name: form.optional("full-name"),
            specialization: form.optional("specialization"),
            experience_years: form.parse_optional("experience", "Experience"),
            fee: form.parse_optional("fee", "Fee"),
            available: form.parse_optional("available", "Availability"),
        })
    }
}

impl ResourceView for Appointment {
    const LABEL: &'static str = "Appointment";

    fn title(&self) -> String {
        format!("Appointment #{}", self.id)
    }

    fn summary(&self) -> String {
        format!(
            "{} {} | Doctor #{} | Patient #{} | {} | ${:.2}",
            self.date,
            self.time.format("%H:%M"),
            self.doctor_id,
            self.patient_id,
            self.status,
            self.amount
        )
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.title(), self.summary())
    }

    fn create_fields() -> &'static [&'static str] {
        &["doctor-id", "date", "time", "amount"]
    }

    fn draft_from_form(form: &mut Form, session: &Session) -> Option<AppointmentDraft> {
        let patient_id = signed_in_user(form, session);
        let doctor_id = form.parse::<i64>("doctor-id", "Doctor");
        let date = form.parse("date", "Date");
        let time = form.time("time", "Time", true);
        let amount = form.parse::<f64>("amount", "Amount");
        let amount = positive_amount(form, "amount", amount);
        Some(AppointmentDraft {
            patient_id: patient_id?,
            doctor_id: doctor_id?,
            date: date?,
            time: time?,
            amount: amount?,
        })
    }

    fn edit_form(&self) -> Form {
        Form::prefilled(&[
            ("date", self.date.to_string()),
            ("time", self.time.format("%H:%M").to_string()),
            ("status", self.status.as_str().to_string()),
            ("amount", self.amount.to_string()),
        ])
    }

    fn patch_from_form(form: &mut Form) -> Option<AppointmentPatch> {
        let status = match form.optional("status") {
            Some(raw) => match AppointmentStatus::parse(&raw) {
                Some(status) => Some(status),
                None => {
                    form.reject("status", "Status is invalid");
                    return None;
                }
            },
            None => None,
        };
        let amount = form.parse_optional::<f64>("amount", "Amount");
        Some(AppointmentPatch {
            date: form.parse_optional("date", "Date"),
            time: form.time("time", "Time", false),
            status,
            amount: positive_amount(form, "amount", amount),
        })
    }
}

impl ResourceView for Prescription {
    const LABEL: &'static str = "Prescription";

    fn title(&self) -> String {
        self.medicine.clone()
    }

    fn summary(&self) -> String {
        format!(
            "{} | {} | Patient #{} | Appointment #{}",
            self.medicine, self.dosage, self.patient_id, self.appointment_id
        )
    }

    fn create_fields() -> &'static [&'static str] {
        &["appointment-id", "patient-id", "medicine", "dosage", "notes"]
    }

    fn draft_from_form(form: &mut Form, session: &Session) -> Option<PrescriptionDraft> {
        let doctor_id = signed_in_user(form, session);
        let appointment_id = form.parse::<i64>("appointment-id", "Appointment");
        let patient_id = form.parse::<i64>("patient-id", "Patient");
        let medicine = form.required("medicine", "Medicine");
        let dosage = form.required("dosage", "Dosage");
        Some(PrescriptionDraft {
            appointment_id: appointment_id?,
            patient_id: patient_id?,
            doctor_id: doctor_id?,
            medicine: medicine?,
            dosage: dosage?,
            notes: form.optional("notes"),
        })
    }

    fn edit_form(&self) -> Form {
        Form::prefilled(&[
            ("medicine", self.medicine.clone()),
            ("dosage", self.dosage.clone()),
            ("notes", self.notes.clone().unwrap_or_default()),
        ])
    }

    fn patch_from_form(form: &mut Form) -> Option<PrescriptionPatch> {
        Some(PrescriptionPatch {
            medicine: form.optional("medicine"),
            dosage: form.optional("dosage"),
            notes: form.optional("notes"),
        })
    }
}

impl ResourceView for Complaint {
    const LABEL: &'static str = "Complaint";

    fn title(&self) -> String {
        self.subject.clone()
    }

    fn summary(&self) -> String {
        format!("{} | {} | {}", self.subject, self.status.as_str(), self.description)
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.subject, self.description)
    }

    fn create_fields() -> &'static [&'static str] {
        &["subject", "description"]
    }

    fn draft_from_form(form: &mut Form, session: &Session) -> Option<ComplaintDraft> {
        let user_id = signed_in_user(form, session);
        let subject = form.required("subject", "Subject");
        let description = form.required("description", "Description");
        Some(ComplaintDraft {
            user_id: user_id?,
            subject: subject?,
            description: description?,
        })
    }

    fn edit_form(&self) -> Form {
        Form::prefilled(&[
            ("status", self.status.as_str().to_string()),
            ("description", self.description.clone()),
        ])
    }

    fn patch_from_form(form: &mut Form) -> Option<ComplaintPatch> {
        let status = match form.optional("status") {
            Some(raw) => match ComplaintStatus::parse(&raw) {
                Some(status) => Some(status),
                None => {
                    form.reject("status", "Status is invalid");
                    return None;
                }
            },
            None => None,
        };
        Some(ComplaintPatch {
            description: form.optional("description"),
            status,
        })
    }
}

impl ResourceView for Payment {
    const LABEL: &'static str = "Payment";

    fn title(&self) -> String {
        format!("Payment #{}", self.id)
    }

    fn summary(&self) -> String {
        format!(
            "Appointment #{} | ${:.2} | {} | {}",
            self.appointment_id,
            self.amount,
            self.method,
            self.status.as_str()
        )
    }

    fn create_fields() -> &'static [&'static str] {
        &["appointment-id", "amount", "method"]
    }

    fn draft_from_form(form: &mut Form, _session: &Session) -> Option<PaymentDraft> {
        let appointment_id = form.parse::<i64>("appointment-id", "Appointment");
        let amount = form.parse::<f64>("amount", "Amount");
        let amount = positive_amount(form, "amount", amount);
        let method = form.required("method", "Payment method");
        Some(PaymentDraft {
            appointment_id: appointment_id?,
            amount: amount?,
            method: method?,
        })
    }

    fn edit_form(&self) -> Form {
        Form::prefilled(&[("status", self.status.as_str().to_string())])
    }

    fn patch_from_form(form: &mut Form) -> Option<PaymentPatch> {
        let status = match form.optional("status") {
            Some(raw) => match PaymentStatus::parse(&raw) {
                Some(status) => Some(status),
                None => {
                    form.reject("status", "Status is invalid");
                    return None;
                }
            },
            None => None,
        };
        Some(PaymentPatch { status })
    }

    fn created_message() -> String {
        "Payment successful!".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appointment_drafts_take_the_patient_from_the_session() {
        let session = Session {
            user_id: Some(3),
            ..Session::guest()
        };
        let mut form = Form::with_fields(Appointment::create_fields());
        form.set("doctor-id", "2");
        form.set("date", "2026-11-02");
        form.set("time", "09:30");
        form.set("amount", "80");

        let draft = Appointment::draft_from_form(&mut form, &session).unwrap();
        assert_eq!(draft.patient_id, 3);
        assert_eq!(draft.doctor_id, 2);
        assert!(form.is_valid());
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let mut form = Form::with_fields(&["amount"]);
        form.set("amount", "0");
        let patch = Appointment::patch_from_form(&mut form);
        assert!(patch.is_some_and(|p| p.amount.is_none()));
        assert_eq!(form.error("amount"), Some("Amount must be greater than zero"));
    }

    #[test]
    fn unknown_roles_are_field_errors() {
        let mut form = Form::with_fields(User::create_fields());
        form.set("full-name", "Ada Lovelace");
        form.set("email", "ada@careconnect.test");
        form.set("password", "Password123!");
        form.set("role", "nurse");

        assert!(User::draft_from_form(&mut form, &Session::guest()).is_none());
        assert!(form.error("role").is_some());
    }
}
