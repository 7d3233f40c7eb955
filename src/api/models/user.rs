use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::endpoint::Resource;
use crate::api::tags::Tag;

/// 后端返回的角色声明
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            // 旧版接口使用 "user" 表示患者
            "patient" | "user" => Some(Role::Patient),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Resource for User {
    type Model = User;
    type Draft = UserDraft;
    type Patch = UserPatch;

    const SINGULAR: &'static str = "user";
    const PLURAL: &'static str = "users";
    const TAG: Tag = Tag::User;

    fn id(model: &User) -> i64 {
        model.id
    }

    fn materialize(id: i64, draft: UserDraft) -> User {
        User {
            id,
            full_name: draft.full_name,
            email: draft.email,
            role: draft.role,
            phone: draft.phone,
        }
    }

    fn apply(model: &mut User, patch: UserPatch) {
        if let Some(full_name) = patch.full_name {
            model.full_name = full_name;
        }
        if patch.phone.is_some() {
            model.phone = patch.phone;
        }
        if let Some(role) = patch.role {
            model.role = role;
        }
    }

    // 删除用户会级联删除其医生档案和预约
    fn delete_invalidates() -> Vec<Tag> {
        vec![Tag::User, Tag::Doctor, Tag::Appointment]
    }
}
