//! 无界面的应用外壳
//!
//! 持有导航器、当前页面和通知队列。会话状态的每次变化都会触发一次
//! 导航：进入角色时去其首页，回到访客时清空缓存并去登录页。

use std::time::Instant;

use crate::AppState;
use crate::router::{self, Navigation, Navigator, PUBLIC_ROUTES, ROLE_ROUTES};
use crate::session::SessionState;
use crate::ui::pages::{self, Effect, Page};
use crate::ui::screen::{Element, Screen};
use crate::ui::selectors;
use crate::ui::toast::{Toast, Toasts};
use crate::ui::UiError;

/// 导航栏链接：(选择器, 文字, 路径)
pub fn nav_links(state: SessionState) -> Vec<(String, String, &'static str)> {
    let paths: Vec<&'static str> = match state.role() {
        Some(role) => ROLE_ROUTES
            .iter()
            .filter(|binding| binding.role == role)
            .flat_map(|binding| binding.patterns.iter().copied())
            .filter(|pattern| !pattern.contains(':'))
            .collect(),
        None => PUBLIC_ROUTES.to_vec(),
    };

    paths
        .into_iter()
        .map(|path| {
            let section = match path.rsplit('/').next() {
                Some("") | None => "home",
                Some(last) => last,
            };
            let mut label = section.replace('-', " ");
            if let Some(first) = label.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            (selectors::nav_link(section), label, path)
        })
        .collect()
}

pub struct App {
    state: AppState,
    navigator: Navigator,
    page: Box<dyn Page>,
    toasts: Toasts,
    seen: SessionState,
}

impl App {
    /// 恢复已持久化的会话并挂载首页
    pub async fn launch(state: AppState) -> Self {
        let seen = state.session.restore().await;
        let navigator = Navigator::new();
        let page = pages::mount(navigator.location(), seen, &state.api);
        Self {
            state,
            navigator,
            page,
            toasts: Toasts::default(),
            seen,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn location(&self) -> &str {
        self.navigator.location()
    }

    pub fn history(&self) -> &[String] {
        self.navigator.history()
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    pub fn visit(&mut self, path: &str) -> Navigation {
        self.sync_session();
        let navigation = self.navigator.visit(self.seen, path);
        // 等同于重新加载页面
        self.mount(true);
        navigation
    }

    fn mount(&mut self, reload: bool) {
        if !reload && self.page.route() == self.navigator.location() {
            return;
        }
        // 先挂载新页面，再丢弃旧页面，两者共享的查询不会被淘汰
        let page = pages::mount(self.navigator.location(), self.seen, &self.state.api);
        let previous = std::mem::replace(&mut self.page, page);
        drop(previous);
        self.state.cache.collect_garbage(Instant::now());
    }

    /// 会话状态与上次看到的不同时导航
    fn sync_session(&mut self) {
        let current = self.state.session.state();
        if current == self.seen {
            return;
        }
        tracing::info!("Session changed from {:?} to {:?}", self.seen, current);
        self.seen = current;
        if current.is_guest() {
            self.state.cache.reset();
        }
        self.navigator.on_session_change(current);
        self.mount(false);
    }

    pub fn type_into(&mut self, selector: &str, index: usize, value: &str) -> Result<(), UiError> {
        self.page.type_into(selector, index, value)
    }

    pub async fn click(&mut self, selector: &str, index: usize) -> Result<(), UiError> {
        if selector == selectors::LOGOUT_BUTTON && !self.seen.is_guest() {
            self.state.api.logout().await;
            self.toasts.push(Toast::success("Logged out successfully"));
            self.sync_session();
            return Ok(());
        }
        if let Some((_, _, path)) = nav_links(self.seen)
            .into_iter()
            .find(|(link, _, _)| link == selector)
        {
            self.visit(path);
            return Ok(());
        }
        // 登录页和注册页之间的互链
        if selector == selectors::nav_link("signup") || selector == selectors::nav_link("login") {
            let path = if selector.ends_with("signup") {
                router::SIGNUP_ROUTE
            } else {
                router::LOGIN_ROUTE
            };
            self.visit(path);
            return Ok(());
        }

        let effects = self.page.click(selector, index).await?;
        for effect in effects {
            match effect {
                Effect::Toast(toast) => self.toasts.push(toast),
                Effect::Navigate(path) => {
                    self.visit(&path);
                }
            }
        }
        self.sync_session();
        Ok(())
    }

    /// 等待当前页面的查询稳定，并处理期间发生的会话变化
    pub async fn settle(&mut self) {
        self.page.settle().await;
        if self.state.session.state() != self.seen {
            let failed = !self.seen.is_guest() && self.state.session.state().is_guest();
            self.sync_session();
            if failed {
                self.toasts.push(Toast::error("Your session has expired. Please log in again."));
            }
            self.page.settle().await;
        }
    }

    pub fn screen(&self) -> Screen {
        let mut screen = Screen::new(self.navigator.location());
        for (selector, label, _) in nav_links(self.seen) {
            screen.push(Element::new(selector, label));
        }
        if !self.seen.is_guest() {
            screen.push(Element::new(selectors::LOGOUT_BUTTON, "Logout"));
        }
        screen.extend(self.page.render().elements().iter().cloned());
        for toast in self.toasts.items() {
            screen.push(Element::new(toast.selector(), toast.message.as_str()));
        }
        screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_links_follow_role_bindings() {
        let links = nav_links(SessionState::Patient);
        let selectors: Vec<&str> = links.iter().map(|(s, _, _)| s.as_str()).collect();
        assert!(selectors.contains(&"nav-dashboard"));
        assert!(selectors.contains(&"nav-payments"));
        assert!(!selectors.contains(&"nav-users"));

        let guest = nav_links(SessionState::Guest);
        assert!(guest.iter().any(|(s, _, p)| s == "nav-home" && *p == "/"));
        assert!(guest.iter().any(|(s, l, _)| s == "nav-login" && l == "Login"));
    }
}
