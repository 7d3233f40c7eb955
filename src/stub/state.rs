use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Value, json};
use thiserror::Error;

use crate::api::Resource;
use crate::api::models::{Role, User};
use crate::config::Config;
use crate::utils::hash_password;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to hash seed password: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// 登录凭据
#[derive(Clone)]
pub struct Account {
    pub user_id: i64,
    pub password_hash: String,
}

/// 按资源复数名分表保存的 JSON 记录
#[derive(Default)]
pub struct Tables {
    records: HashMap<&'static str, BTreeMap<i64, Value>>,
    accounts: HashMap<String, Account>,
    next_id: i64,
}

impl Tables {
    pub fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn list<R: Resource>(&self) -> Vec<R::Model> {
        self.records
            .get(R::PLURAL)
            .map(|table| {
                table
                    .values()
                    .filter_map(|value| serde_json::from_value(value.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get<R: Resource>(&self, id: i64) -> Option<R::Model> {
        self.records
            .get(R::PLURAL)
            .and_then(|table| table.get(&id))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn put<R: Resource>(&mut self, model: &R::Model) {
        if let Ok(value) = serde_json::to_value(model) {
            self.records
                .entry(R::PLURAL)
                .or_default()
                .insert(R::id(model), value);
        }
    }

    pub fn insert<R: Resource>(&mut self, draft: R::Draft) -> R::Model {
        let id = self.allocate_id();
        let model = R::materialize(id, draft);
        self.put::<R>(&model);
        model
    }

    pub fn update<R: Resource>(&mut self, id: i64, patch: R::Patch) -> Option<R::Model> {
        let mut model = self.get::<R>(id)?;
        R::apply(&mut model, patch);
        self.put::<R>(&model);
        Some(model)
    }

    pub fn remove<R: Resource>(&mut self, id: i64) -> bool {
        self.records
            .get_mut(R::PLURAL)
            .is_some_and(|table| table.remove(&id).is_some())
    }

    /// 删除满足条件的记录，返回删除数量
    pub fn remove_where<R: Resource>(&mut self, predicate: impl Fn(&R::Model) -> bool) -> usize {
        let doomed: Vec<i64> = self
            .list::<R>()
            .iter()
            .filter(|model| predicate(model))
            .map(R::id)
            .collect();
        for id in &doomed {
            self.remove::<R>(*id);
        }
        doomed.len()
    }

    fn seed(&mut self, plural: &'static str, record: Value) {
        if let Some(id) = record.get("id").and_then(Value::as_i64) {
            self.records.entry(plural).or_default().insert(id, record);
            self.next_id = self.next_id.max(id);
        }
    }

    pub fn account(&self, email: &str) -> Option<&Account> {
        self.accounts.get(&email.trim().to_lowercase())
    }

    pub fn add_account(&mut self, email: &str, user_id: i64, password_hash: String) {
        self.accounts.insert(
            email.trim().to_lowercase(),
            Account {
                user_id,
                password_hash,
            },
        );
    }

    pub fn remove_accounts_of(&mut self, user_id: i64) {
        self.accounts.retain(|_, account| account.user_id != user_id);
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.account(email).is_some()
    }
}

/// 桩服务端共享状态
#[derive(Clone)]
pub struct StubState {
    tables: Arc<Mutex<Tables>>,
    hits: Arc<Mutex<HashMap<String, u64>>>,
    pub secret: Arc<String>,
    pub token_ttl_secs: i64,
}

pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

impl StubState {
    pub fn empty(secret: &str) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            hits: Arc::new(Mutex::new(HashMap::new())),
            secret: Arc::new(secret.to_string()),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    /// 预置三种角色的账户，以及医生、服务、预约等演示数据
    pub fn seeded(config: &Config) -> Result<Self, SeedError> {
        let state = Self::empty(&uuid::Uuid::new_v4().to_string());
        {
            let mut tables = state.tables();
            let users = [
                (1, "Site Administrator", &config.admin.email, &config.admin.password, Role::Admin),
                (2, "Dennis Ritchie", &config.doctor.email, &config.doctor.password, Role::Doctor),
                (3, "Pat Jones", &config.patient.email, &config.patient.password, Role::Patient),
            ];
            for (id, name, email, password, role) in users {
                tables.put::<User>(&User {
                    id,
                    full_name: name.to_string(),
                    email: email.clone(),
                    role,
                    phone: None,
                });
                tables.add_account(email, id, hash_password(password)?);
            }

            let doctors = [
                (2, "Dennis Ritchie", config.doctor.email.as_str(), "Neurology", 12, 150.0),
                (4, "Grace Hopper", "grace.hopper@careconnect.test", "Cardiology", 20, 200.0),
                (5, "Dennis Nedry", "dennis.nedry@careconnect.test", "Dermatology", 3, 90.0),
                (6, "Alan Turing", "alan.turing@careconnect.test", "Psychiatry", 8, 120.0),
            ];
            for (id, name, email, specialization, years, fee) in doctors {
                if id != 2 {
                    tables.seed(
                        "users",
                        json!({"id": id, "fullName": name, "email": email, "role": "doctor"}),
                    );
                    tables.add_account(email, id, hash_password(&config.doctor.password)?);
                }
                tables.seed(
                    "doctors",
                    json!({
                        "id": id,
                        "fullName": name,
                        "email": email,
                        "specialization": specialization,
                        "experienceYears": years,
                        "fee": fee,
                        "available": true,
                    }),
                );
            }

            tables.seed(
                "services",
                json!({"id": 7, "title": "General Checkup", "description": "Routine health examination", "price": 60.0}),
            );
            tables.seed(
                "services",
                json!({"id": 8, "title": "Cardiology Consultation", "description": "Heart health assessment", "price": 180.0}),
            );
            tables.seed(
                "services",
                json!({"id": 9, "title": "Eye Care", "description": "Vision testing and eye exams", "price": 75.0}),
            );

            tables.seed(
                "appointments",
                json!({"id": 10, "patientId": 3, "doctorId": 2, "date": "2026-11-03", "time": "10:00:00", "status": "Pending", "amount": 150.0}),
            );
            tables.seed(
                "appointments",
                json!({"id": 11, "patientId": 3, "doctorId": 4, "date": "2026-11-05", "time": "14:30:00", "status": "Confirmed", "amount": 200.0}),
            );
            tables.seed(
                "prescriptions",
                json!({"id": 12, "appointmentId": 11, "patientId": 3, "doctorId": 4, "medicine": "Amoxicillin", "dosage": "500mg twice daily"}),
            );
            tables.seed(
                "complaints",
                json!({"id": 13, "userId": 3, "subject": "Long waiting time", "description": "Waited an hour past my slot", "status": "Open"}),
            );
            tables.seed(
                "payments",
                json!({"id": 14, "appointmentId": 11, "amount": 200.0, "method": "card", "status": "Paid"}),
            );
            tables.next_id = tables.next_id.max(100);
        }
        Ok(state)
    }

    pub fn tables(&self) -> MutexGuard<'_, Tables> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn record_hit(&self, key: String) {
        let mut hits = match self.hits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *hits.entry(key).or_default() += 1;
    }

    /// 某个 `METHOD /path` 被请求的次数
    pub fn hits(&self, key: &str) -> u64 {
        match self.hits.lock() {
            Ok(hits) => hits.get(key).copied().unwrap_or(0),
            Err(poisoned) => poisoned.into_inner().get(key).copied().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Appointment, Doctor, Service};

    #[test]
    fn seeded_records_decode_into_models() {
        let state = StubState::seeded(&Config::for_domain("http://127.0.0.1:9")).unwrap();
        let tables = state.tables();

        let doctors = tables.list::<Doctor>();
        assert_eq!(doctors.len(), 4);
        assert!(doctors.iter().filter(|d| d.full_name.contains("Dennis")).count() >= 2);
        assert_eq!(tables.list::<Appointment>().len(), 2);
        assert_eq!(tables.list::<Service>().len(), 3);
        assert_eq!(tables.list::<User>().len(), 6);
        assert!(tables.account("ADMIN@careconnect.test").is_some());
    }

    #[test]
    fn inserted_records_get_fresh_ids() {
        let state = StubState::seeded(&Config::for_domain("http://127.0.0.1:9")).unwrap();
        let mut tables = state.tables();
        let service = tables.insert::<Service>(crate::api::models::ServiceDraft {
            title: "Physiotherapy".into(),
            description: "Rehabilitation sessions".into(),
            price: 95.0,
        });
        assert!(service.id > 100);
        assert_eq!(tables.get::<Service>(service.id), Some(service));
    }
}
