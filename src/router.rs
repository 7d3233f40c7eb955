//! 基于角色的路由守卫
//!
//! 角色与路由的绑定是一张静态表；所有导航都经过 [`guard`]。

use crate::api::models::Role;
use crate::session::SessionState;

pub const LOGIN_ROUTE: &str = "/login";
pub const SIGNUP_ROUTE: &str = "/signup";
pub const HOME_ROUTE: &str = "/";

/// 任何状态都可访问的页面
pub const PUBLIC_ROUTES: &[&str] = &["/", "/about", "/services", "/contact", LOGIN_ROUTE, SIGNUP_ROUTE];

pub struct RoleRoutes {
    pub role: Role,
    pub landing: &'static str,
    pub patterns: &'static [&'static str],
}

pub const ROLE_ROUTES: &[RoleRoutes] = &[
    RoleRoutes {
        role: Role::Admin,
        landing: "/admin/dashboard",
        patterns: &[
            "/admin/dashboard",
            "/admin/dashboard/users",
            "/admin/dashboard/doctors",
            "/admin/dashboard/doctors/:id",
            "/admin/dashboard/appointments",
            "/admin/dashboard/prescriptions",
            "/admin/dashboard/complaints",
            "/admin/dashboard/services",
            "/admin/dashboard/payments",
            "/admin/dashboard/profile",
        ],
    },
    RoleRoutes {
        role: Role::Doctor,
        landing: "/doctor/dashboard",
        patterns: &[
            "/doctor/dashboard",
            "/doctor/dashboard/appointments",
            "/doctor/dashboard/prescriptions",
            "/doctor/dashboard/profile",
        ],
    },
    RoleRoutes {
        role: Role::Patient,
        landing: "/patient/dashboard",
        patterns: &[
            "/patient/dashboard",
            "/patient/dashboard/doctors",
            "/patient/dashboard/appointments",
            "/patient/dashboard/prescriptions",
            "/patient/dashboard/complaints",
            "/patient/dashboard/payments",
            "/patient/dashboard/profile",
        ],
    },
];

pub fn bindings(role: Role) -> &'static RoleRoutes {
    ROLE_ROUTES
        .iter()
        .find(|binding| binding.role == role)
        .unwrap_or(&ROLE_ROUTES[0])
}

pub fn landing_route(state: SessionState) -> &'static str {
    match state.role() {
        Some(role) => bindings(role).landing,
        None => LOGIN_ROUTE,
    }
}

/// 去掉查询串、片段和末尾斜杠
pub fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        HOME_ROUTE.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// `:param` 段匹配任意非空段
pub fn matches_pattern(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') && !s.is_empty() => continue,
            (Some(p), Some(s)) if p == s => continue,
            _ => return false,
        }
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_ROUTES.contains(&path)
}

pub fn is_permitted(role: Role, path: &str) -> bool {
    bindings(role)
        .patterns
        .iter()
        .any(|pattern| matches_pattern(pattern, path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allowed(String),
    Redirected { from: String, to: String },
}

impl Navigation {
    pub fn destination(&self) -> &str {
        match self {
            Navigation::Allowed(path) => path,
            Navigation::Redirected { to, .. } => to,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Navigation::Redirected { .. })
    }
}

/// 路由守卫：访客只能去公开页面，角色只能去绑定给它的页面
pub fn guard(state: SessionState, path: &str) -> Navigation {
    let path = normalize(path);
    if is_public(&path) {
        return Navigation::Allowed(path);
    }

    let permitted = state.role().is_some_and(|role| is_permitted(role, &path));
    if permitted {
        Navigation::Allowed(path)
    } else {
        Navigation::Redirected {
            to: landing_route(state).to_string(),
            from: path,
        }
    }
}

/// 当前所在页面与访问历史
#[derive(Debug, Clone)]
pub struct Navigator {
    location: String,
    history: Vec<String>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            location: HOME_ROUTE.to_string(),
            history: vec![HOME_ROUTE.to_string()],
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn visit(&mut self, state: SessionState, path: &str) -> Navigation {
        let navigation = guard(state, path);
        if let Navigation::Redirected { from, to } = &navigation {
            tracing::info!("Route {} not available to {:?}, redirecting to {}", from, state, to);
        }
        self.go(navigation.destination());
        navigation
    }

    /// 会话状态变化：进入角色时落到其默认页面，回到访客时去登录页
    pub fn on_session_change(&mut self, state: SessionState) -> Navigation {
        let target = landing_route(state);
        let navigation = if self.location == target {
            Navigation::Allowed(target.to_string())
        } else {
            Navigation::Redirected {
                from: self.location.clone(),
                to: target.to_string(),
            }
        };
        self.go(target);
        navigation
    }

    fn go(&mut self, path: &str) {
        if self.location != path {
            self.location = path.to_string();
            self.history.push(self.location.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_reaches_appointments_without_redirect() {
        let navigation = guard(SessionState::Admin, "/admin/dashboard/appointments");
        assert_eq!(
            navigation,
            Navigation::Allowed("/admin/dashboard/appointments".into())
        );
    }

    #[test]
    fn patient_is_sent_to_own_landing_route() {
        let navigation = guard(SessionState::Patient, "/admin/dashboard/appointments");
        assert_eq!(navigation.destination(), "/patient/dashboard");
        assert!(navigation.is_redirect());
    }

    #[test]
    fn guests_go_to_login() {
        assert_eq!(
            guard(SessionState::Guest, "/doctor/dashboard").destination(),
            LOGIN_ROUTE
        );
        assert_eq!(guard(SessionState::Guest, "/about"), Navigation::Allowed("/about".into()));
    }

    #[test]
    fn params_and_trailing_slashes_are_handled() {
        assert!(is_permitted(Role::Admin, "/admin/dashboard/doctors/12"));
        assert!(!is_permitted(Role::Admin, "/admin/dashboard/doctors/"));
        assert_eq!(normalize("/admin/dashboard/users/?page=2"), "/admin/dashboard/users");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn every_landing_route_is_permitted_for_its_role() {
        for binding in ROLE_ROUTES {
            assert!(is_permitted(binding.role, binding.landing));
        }
    }

    #[test]
    fn navigator_follows_session_transitions() {
        let mut navigator = Navigator::new();
        navigator.visit(SessionState::Guest, "/login");

        navigator.on_session_change(SessionState::Doctor);
        assert_eq!(navigator.location(), "/doctor/dashboard");

        navigator.visit(SessionState::Doctor, "/patient/dashboard/payments");
        assert_eq!(navigator.location(), "/doctor/dashboard");

        navigator.on_session_change(SessionState::Guest);
        assert_eq!(navigator.location(), LOGIN_ROUTE);
        assert_eq!(
            navigator.history(),
            &["/", "/login", "/doctor/dashboard", "/login"]
        );
    }
}
