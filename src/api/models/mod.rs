// 资源数据模型
// 与后端交互的 JSON 结构，字段使用 camelCase

pub mod appointment;
pub mod auth;
pub mod complaint;
pub mod doctor;
pub mod payment;
pub mod prescription;
pub mod service;
pub mod user;

pub use appointment::{Appointment, AppointmentDraft, AppointmentPatch, AppointmentStatus};
pub use auth::{Login, LoginRequest, LoginResponse, Me, Register, RegisterRequest, RegisterResponse};
pub use complaint::{Complaint, ComplaintDraft, ComplaintPatch, ComplaintStatus};
pub use doctor::{Doctor, DoctorDraft, DoctorPatch};
pub use payment::{Payment, PaymentDraft, PaymentPatch, PaymentStatus};
pub use prescription::{Prescription, PrescriptionDraft, PrescriptionPatch};
pub use service::{Service, ServiceByTitle, ServiceDraft, ServicePatch};
pub use user::{Role, User, UserDraft, UserPatch};
