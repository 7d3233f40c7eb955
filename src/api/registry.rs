use std::collections::BTreeSet;

use crate::api::endpoint::{
    Create, Delete, EndpointDescriptor, EndpointKind, Get, List, MutationEndpoint, QueryEndpoint,
    Resource, Update,
};
use crate::api::models::{
    Appointment, Complaint, Doctor, Login, Me, Payment, Prescription, Register, Service,
    ServiceByTitle, User,
};
use crate::api::tags::Tag;

/// 变更声明了没有任何查询提供的标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnprovidedTag {
    pub mutation: String,
    pub tag: Tag,
}

/// 全部端点描述符
#[derive(Debug, Clone, Default)]
pub struct EndpointSet {
    descriptors: Vec<EndpointDescriptor>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 应用实际注册的端点
    pub fn careconnect() -> Self {
        let mut set = Self::new();
        set.add_resource::<Service>();
        set.add_resource::<User>();
        set.add_resource::<Doctor>();
        set.add_resource::<Appointment>();
        set.add_resource::<Prescription>();
        set.add_resource::<Complaint>();
        set.add_resource::<Payment>();
        set.add(ServiceByTitle.descriptor());
        set.add(Me.descriptor());
        set.add(Login.descriptor());
        set.add(Register.descriptor());
        set
    }

    pub fn add(&mut self, descriptor: EndpointDescriptor) {
        self.descriptors.push(descriptor);
    }

    pub fn add_resource<R: Resource>(&mut self) {
        self.add(List::<R>::new().descriptor());
        self.add(Get::<R>::new().descriptor());
        self.add(Create::<R>::new().descriptor());
        self.add(Update::<R>::new().descriptor());
        self.add(Delete::<R>::new().descriptor());
    }

    pub fn descriptors(&self) -> &[EndpointDescriptor] {
        &self.descriptors
    }

    pub fn find(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// 所有查询提供的标签
    pub fn provided_tags(&self) -> BTreeSet<Tag> {
        self.descriptors
            .iter()
            .filter(|d| d.kind == EndpointKind::Query)
            .flat_map(|d| d.tags.iter().copied())
            .collect()
    }

    /// 每个变更的失效标签必须被至少一个查询提供，否则失效是空操作
    pub fn validate(&self) -> Result<(), Vec<UnprovidedTag>> {
        let provided = self.provided_tags();
        let missing: Vec<UnprovidedTag> = self
            .descriptors
            .iter()
            .filter(|d| d.kind == EndpointKind::Mutation)
            .flat_map(|d| {
                d.tags
                    .iter()
                    .filter(|tag| !provided.contains(tag))
                    .map(|tag| UnprovidedTag {
                        mutation: d.name.clone(),
                        tag: *tag,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::endpoint::HttpMethod;

    #[test]
    fn registered_endpoints_only_invalidate_provided_tags() {
        let set = EndpointSet::careconnect();
        assert_eq!(set.validate(), Ok(()));
        assert_eq!(set.provided_tags().len(), Tag::ALL.len());
    }

    #[test]
    fn names_are_unique() {
        let set = EndpointSet::careconnect();
        let names: BTreeSet<&str> = set.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), set.descriptors().len());
    }

    #[test]
    fn dangling_invalidation_is_reported() {
        let mut set = EndpointSet::new();
        set.add(EndpointDescriptor::query("getServices", "/services", &[Tag::Service]));
        set.add(EndpointDescriptor::mutation(
            "payInvoice",
            HttpMethod::Post,
            "/payment/register",
            &[Tag::Payment],
        ));

        let missing = set.validate().unwrap_err();
        assert_eq!(
            missing,
            vec![UnprovidedTag {
                mutation: "payInvoice".into(),
                tag: Tag::Payment,
            }]
        );
    }

    #[test]
    fn auth_endpoints_are_public() {
        let set = EndpointSet::careconnect();
        let login = set.find("login").unwrap();
        assert_eq!(login.auth, crate::api::endpoint::AuthRequirement::Public);
        let me = set.find("getMe").unwrap();
        assert_eq!(me.auth, crate::api::endpoint::AuthRequirement::Bearer);
    }
}
