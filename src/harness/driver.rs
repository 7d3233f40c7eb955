use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::AppState;
use crate::api::models::Role;
use crate::api::{HttpMethod, InterceptedCall, Interceptor};
use crate::app::App;
use crate::config::{Config, Credentials};
use crate::harness::HarnessError;
use crate::ui::screen::{Element, Screen};
use crate::ui::selectors;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// 测试驱动：访问页面、输入、点击、断言，以及拦截网络请求
pub struct Driver {
    app: App,
    interceptor: Interceptor,
    config: Config,
    timeout: Duration,
    consumed: HashMap<String, usize>,
}

impl Driver {
    /// 每个驱动都从未登录状态开始
    pub async fn new(config: Config) -> Result<Self, HarnessError> {
        let interceptor = Interceptor::new();
        let state = AppState::with_interceptor(config.clone(), interceptor.clone())?;
        state.session.logout().await;
        let app = App::launch(state).await;

        Ok(Self {
            app,
            interceptor,
            config,
            timeout: DEFAULT_COMMAND_TIMEOUT,
            consumed: HashMap::new(),
        })
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn state(&self) -> &AppState {
        self.app.state()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn location(&self) -> &str {
        self.app.location()
    }

    pub fn screen(&self) -> Screen {
        self.app.screen()
    }

    pub async fn settle(&mut self) -> Result<(), HarnessError> {
        tokio::time::timeout(self.timeout, self.app.settle())
            .await
            .map_err(|_| HarnessError::Timeout(self.timeout, format!("{} to settle", self.app.location())))
    }

    pub async fn visit(&mut self, path: &str) -> Result<(), HarnessError> {
        let navigation = self.app.visit(path);
        tracing::debug!("visit {} -> {}", path, navigation.destination());
        self.settle().await
    }

    pub fn get_data_test(&mut self, selector: &str) -> Locator<'_> {
        Locator {
            driver: self,
            selector: selector.to_string(),
            index: 0,
        }
    }

    /// 页面上任一可见元素包含该文字
    pub async fn contains(&mut self, text: &str) -> Result<(), HarnessError> {
        self.settle().await?;
        if self.screen().contains(text) {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!(
                "expected {} to contain {:?}",
                self.location(),
                text
            )))
        }
    }

    pub async fn should_not_contain(&mut self, text: &str) -> Result<(), HarnessError> {
        self.settle().await?;
        if self.screen().contains(text) {
            Err(HarnessError::Assertion(format!(
                "expected {} not to contain {:?}",
                self.location(),
                text
            )))
        } else {
            Ok(())
        }
    }

    pub async fn should_be_on(&mut self, path: &str) -> Result<(), HarnessError> {
        self.settle().await?;
        if self.location() == path {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!(
                "expected location {path}, found {}",
                self.location()
            )))
        }
    }

    /// 记录匹配的请求，请求照常发往后端
    pub fn intercept(&mut self, alias: &str, method: HttpMethod, glob: &str) -> Result<(), HarnessError> {
        self.interceptor.spy(alias, method, glob)?;
        Ok(())
    }

    /// 以固定响应代替后端
    pub fn intercept_with(
        &mut self,
        alias: &str,
        method: HttpMethod,
        glob: &str,
        status: u16,
        body: Value,
    ) -> Result<(), HarnessError> {
        self.interceptor.stub(alias, method, glob, status, body)?;
        Ok(())
    }

    /// 等待别名下下一次尚未取走的调用
    pub async fn wait(&mut self, alias: &str) -> Result<InterceptedCall, HarnessError> {
        let nth = self.consumed.get(alias).copied().unwrap_or(0);
        match self.interceptor.wait(alias, nth, self.timeout).await {
            Some(call) => {
                self.consumed.insert(alias.to_string(), nth + 1);
                Ok(call)
            }
            None => Err(HarnessError::Timeout(self.timeout, format!("@{alias}"))),
        }
    }

    /// 别名下已记录的调用次数
    pub fn calls(&self, alias: &str) -> usize {
        self.interceptor.calls(alias).len()
    }

    pub fn credentials(&self, role: Role) -> Credentials {
        match role {
            Role::Admin => self.config.admin.clone(),
            Role::Doctor => self.config.doctor.clone(),
            Role::Patient => self.config.patient.clone(),
        }
    }

    /// 通过登录页登录并等待进入角色首页
    pub async fn login_as(&mut self, role: Role) -> Result<(), HarnessError> {
        let credentials = self.credentials(role);
        self.visit("/login").await?;
        self.get_data_test(selectors::EMAIL_INPUT).type_text(&credentials.email).await?;
        self.get_data_test(selectors::PASSWORD_INPUT)
            .type_text(&credentials.password)
            .await?;
        self.get_data_test(selectors::LOGIN_BUTTON).click().await?;

        let landing = crate::router::bindings(role).landing;
        self.should_be_on(landing).await
    }

    pub async fn login_as_admin(&mut self) -> Result<(), HarnessError> {
        self.login_as(Role::Admin).await
    }

    pub async fn login_as_doctor(&mut self) -> Result<(), HarnessError> {
        self.login_as(Role::Doctor).await
    }

    pub async fn login_as_patient(&mut self) -> Result<(), HarnessError> {
        self.login_as(Role::Patient).await
    }
}

/// 一个选择器的查询结果，类似 `cy.get('[data-test=...]')`
pub struct Locator<'a> {
    driver: &'a mut Driver,
    selector: String,
    index: usize,
}

impl Locator<'_> {
    pub fn first(mut self) -> Self {
        self.index = 0;
        self
    }

    pub fn eq(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    fn elements(&self) -> Vec<Element> {
        self.driver
            .screen()
            .select(&self.selector)
            .into_iter()
            .cloned()
            .collect()
    }

    fn element(&self) -> Result<Element, HarnessError> {
        self.elements().into_iter().nth(self.index).ok_or_else(|| {
            HarnessError::Assertion(format!(
                "[data-test={}] (index {}) not found on {}",
                self.selector,
                self.index,
                self.driver.location()
            ))
        })
    }

    pub async fn type_text(self, text: &str) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        self.driver.app.type_into(&self.selector, self.index, text)?;
        Ok(())
    }

    pub async fn click(self) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        self.element()?;
        self.driver.app.click(&self.selector, self.index).await?;
        self.driver.settle().await
    }

    pub async fn texts(self) -> Result<Vec<String>, HarnessError> {
        self.driver.settle().await?;
        Ok(self.elements().into_iter().map(|e| e.text).collect())
    }

    pub async fn should_exist(self) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        self.element().map(|_| ())
    }

    pub async fn should_not_exist(self) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        if self.elements().is_empty() {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!(
                "expected no [data-test={}] on {}",
                self.selector,
                self.driver.location()
            )))
        }
    }

    pub async fn should_be_visible(self) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        let element = self.element()?;
        if element.visible {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!("[data-test={}] is hidden", self.selector)))
        }
    }

    pub async fn should_contain(self, text: &str) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        let element = self.element()?;
        if element.text.contains(text) {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!(
                "expected [data-test={}] to contain {:?}, found {:?}",
                self.selector, text, element.text
            )))
        }
    }

    pub async fn should_have_value(self, value: &str) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        let element = self.element()?;
        if element.value.as_deref() == Some(value) {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!(
                "expected [data-test={}] to have value {:?}, found {:?}",
                self.selector, value, element.value
            )))
        }
    }

    pub async fn should_have_length(self, length: usize) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        let found = self.elements().len();
        if found == length {
            Ok(())
        } else {
            Err(HarnessError::Assertion(format!(
                "expected {length} [data-test={}], found {found}",
                self.selector
            )))
        }
    }

    /// 每一个匹配元素都包含该文字
    pub async fn each_should_contain(self, text: &str) -> Result<(), HarnessError> {
        self.driver.settle().await?;
        let elements = self.elements();
        if elements.is_empty() {
            return Err(HarnessError::Assertion(format!("no [data-test={}] found", self.selector)));
        }
        match elements.iter().find(|e| !e.text.contains(text)) {
            None => Ok(()),
            Some(element) => Err(HarnessError::Assertion(format!(
                "[data-test={}] {:?} does not contain {:?}",
                self.selector, element.text, text
            ))),
        }
    }
}
