use std::fmt;

use serde::{Deserialize, Serialize};

/// 缓存标签：查询结果以其标记，变更以其声明失效范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    Service,
    User,
    Doctor,
    Appointment,
    Prescription,
    Complaint,
    Payment,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::Service,
        Tag::User,
        Tag::Doctor,
        Tag::Appointment,
        Tag::Prescription,
        Tag::Complaint,
        Tag::Payment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Service => "Service",
            Tag::User => "User",
            Tag::Doctor => "Doctor",
            Tag::Appointment => "Appointment",
            Tag::Prescription => "Prescription",
            Tag::Complaint => "Complaint",
            Tag::Payment => "Payment",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
