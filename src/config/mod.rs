use std::env;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// 一个角色的登录凭据（用于端到端流程）
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_domain: String,
    pub sentry_dsn: Option<String>,
    pub trace_propagation_targets: Option<Regex>,
    pub request_timeout_secs: u64,
    pub cache_keep_unused_secs: u64,
    pub redis_url: Option<String>,
    pub admin: Credentials,
    pub doctor: Credentials,
    pub patient: Credentials,
    pub use_stub_backend: bool,
}

// 与桩服务端预置账号保持一致
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@careconnect.test";
pub const DEFAULT_DOCTOR_EMAIL: &str = "dennis.ritchie@careconnect.test";
pub const DEFAULT_PATIENT_EMAIL: &str = "patient@careconnect.test";
pub const DEFAULT_PASSWORD: &str = "Password123!";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CACHE_KEEP_UNUSED_SECS: u64 = 60;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源构建配置，测试中用闭包代替进程环境
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let use_stub_backend = lookup("E2E_STUB_BACKEND")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        // 使用桩服务端时地址在启动后才确定
        let api_domain = match lookup("API_DOMAIN") {
            Some(domain) => domain.trim_end_matches('/').to_string(),
            None if use_stub_backend => String::new(),
            None => return Err(ConfigError::Missing("API_DOMAIN")),
        };

        let trace_propagation_targets = match lookup("TRACE_PROPAGATION_TARGETS") {
            Some(pattern) if !pattern.trim().is_empty() => {
                Some(Regex::new(pattern.trim()).map_err(|e| ConfigError::Invalid {
                    key: "TRACE_PROPAGATION_TARGETS",
                    reason: e.to_string(),
                })?)
            }
            _ => None,
        };

        let credentials = |prefix: &str, default_email: &str| Credentials {
            email: lookup(&format!("E2E_{prefix}_EMAIL")).unwrap_or_else(|| default_email.into()),
            password: lookup(&format!("E2E_{prefix}_PASSWORD"))
                .unwrap_or_else(|| DEFAULT_PASSWORD.into()),
        };

        Ok(Config {
            api_domain,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            trace_propagation_targets,
            request_timeout_secs: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            cache_keep_unused_secs: parse_or(
                &lookup,
                "CACHE_KEEP_UNUSED_SECS",
                DEFAULT_CACHE_KEEP_UNUSED_SECS,
            )?,
            redis_url: lookup("REDIS_URL").filter(|v| !v.is_empty()),
            admin: credentials("ADMIN", DEFAULT_ADMIN_EMAIL),
            doctor: credentials("DOCTOR", DEFAULT_DOCTOR_EMAIL),
            patient: credentials("PATIENT", DEFAULT_PATIENT_EMAIL),
            use_stub_backend,
        })
    }

    /// 指向给定后端地址的默认配置
    pub fn for_domain(api_domain: &str) -> Self {
        let credentials = |email: &str| Credentials {
            email: email.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        };
        Config {
            api_domain: api_domain.trim_end_matches('/').to_string(),
            sentry_dsn: None,
            trace_propagation_targets: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_keep_unused_secs: DEFAULT_CACHE_KEEP_UNUSED_SECS,
            redis_url: None,
            admin: credentials(DEFAULT_ADMIN_EMAIL),
            doctor: credentials(DEFAULT_DOCTOR_EMAIL),
            patient: credentials(DEFAULT_PATIENT_EMAIL),
            use_stub_backend: false,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_keep_unused(&self) -> Duration {
        Duration::from_secs(self.cache_keep_unused_secs)
    }

    /// 是否允许向该来源附加追踪请求头
    pub fn is_traced_origin(&self, url: &str) -> bool {
        self.trace_propagation_targets
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(url))
    }
}

fn parse_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            reason: format!("expected an integer, got {raw:?}"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn api_domain_is_required_without_stub() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("API_DOMAIN")));
    }

    #[test]
    fn stub_mode_does_not_need_api_domain() {
        let config = Config::from_lookup(lookup_from(&[("E2E_STUB_BACKEND", "true")])).unwrap();
        assert!(config.use_stub_backend);
        assert!(config.api_domain.is_empty());
        assert_eq!(config.admin.email, DEFAULT_ADMIN_EMAIL);
    }

    #[test]
    fn trailing_slash_is_trimmed_and_defaults_apply() {
        let config =
            Config::from_lookup(lookup_from(&[("API_DOMAIN", "https://api.example.com/")]))
                .unwrap();
        assert_eq!(config.api_domain, "https://api.example.com");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.cache_keep_unused(), Duration::from_secs(60));
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn traced_origin_pattern_is_matched() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_DOMAIN", "https://api.example.com"),
            ("TRACE_PROPAGATION_TARGETS", r"^https://api\.example\.com"),
        ]))
        .unwrap();
        assert!(config.is_traced_origin("https://api.example.com/doctors"));
        assert!(!config.is_traced_origin("https://elsewhere.example.org/"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("API_DOMAIN", "http://localhost"),
            ("REQUEST_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                ..
            }
        ));
    }
}
