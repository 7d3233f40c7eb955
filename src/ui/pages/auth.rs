use async_trait::async_trait;

use crate::api::Api;
use crate::api::models::RegisterRequest;
use crate::error::ApiError;
use crate::router::{LOGIN_ROUTE, SIGNUP_ROUTE};
use crate::ui::UiError;
use crate::ui::feedback::{Feedback, translate};
use crate::ui::form::Form;
use crate::ui::pages::{Effect, Page, no_such_element};
use crate::ui::screen::{Element, Screen};
use crate::ui::selectors;
use crate::ui::toast::Toast;

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn type_into_form(form: &mut Form, selector: &str, index: usize, value: &str) -> Result<(), UiError> {
    let field = selectors::field_of(selector).ok_or_else(|| UiError::NotEditable(selector.to_string()))?;
    if form.set(field, value) {
        Ok(())
    } else {
        Err(no_such_element(selector, index))
    }
}

pub struct LoginPage {
    api: Api,
    form: Form,
}

impl LoginPage {
    pub fn new(api: Api) -> Self {
        Self {
            api,
            form: Form::with_fields(&["email", "password"]),
        }
    }

    async fn submit(&mut self) -> Vec<Effect> {
        self.form.clear_errors();
        let email = self.form.required("email", "Email");
        let password = self.form.required("password", "Password");
        let (Some(email), Some(password)) = (email, password) else {
            return Vec::new();
        };

        let result = self.api.login(&email, &password).await;
        match result.into_result() {
            Ok(response) => {
                tracing::info!("Signed in as {}", response.role());
                vec![Effect::Toast(Toast::success("Login successful!"))]
            }
            // 登录接口的 401 表示凭据错误，不是会话过期
            Err(ApiError::Unauthorized(message)) => vec![Effect::Toast(Toast::error(message))],
            Err(e) => match translate(&e) {
                Feedback::Inline { message, fields } => {
                    self.form.server_errors(&message, &fields);
                    Vec::new()
                }
                Feedback::Toast(toast) | Feedback::SignIn(toast) => vec![Effect::Toast(toast)],
            },
        }
    }
}

#[async_trait]
impl Page for LoginPage {
    fn route(&self) -> &str {
        LOGIN_ROUTE
    }

    fn render(&self) -> Screen {
        let mut screen = Screen::new(LOGIN_ROUTE);
        screen.push(Element::new(selectors::PAGE_HEADING, "Login"));
        self.form.render(&mut screen);
        screen.push(Element::new(selectors::LOGIN_BUTTON, "Login"));
        screen.push(Element::new(selectors::nav_link("signup"), "Don't have an account? Sign up"));
        screen
    }

    fn type_into(&mut self, selector: &str, index: usize, value: &str) -> Result<(), UiError> {
        type_into_form(&mut self.form, selector, index, value)
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<Vec<Effect>, UiError> {
        match selector {
            selectors::LOGIN_BUTTON => Ok(self.submit().await),
            _ => Err(no_such_element(selector, index)),
        }
    }
}

pub struct SignupPage {
    api: Api,
    form: Form,
}

impl SignupPage {
    pub fn new(api: Api) -> Self {
        Self {
            api,
            form: Form::with_fields(&["full-name", "email", "phone", "password", "confirm-password"]),
        }
    }

    /// 本地校验；失败时不发出注册请求
    fn validate(&mut self) -> Option<RegisterRequest> {
        let full_name = self.form.required("full-name", "Full name");
        let email = self.form.required("email", "Email");
        let password = self.form.required("password", "Password");
        let confirm = self.form.required("confirm-password", "Confirm password");

        if let Some(email) = &email {
            if !email.contains('@') {
                self.form.reject("email", "Please enter a valid email");
            }
        }
        if let Some(password) = &password {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                self.form.reject(
                    "password",
                    &format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
                );
            }
        }
        if let (Some(password), Some(confirm)) = (&password, &confirm) {
            if password != confirm {
                self.form.reject("confirm-password", "Passwords must match");
            }
        }

        if !self.form.is_valid() {
            return None;
        }
        Some(RegisterRequest {
            full_name: full_name?,
            email: email?,
            password: password?,
            phone: self.form.optional("phone"),
        })
    }

    async fn submit(&mut self) -> Vec<Effect> {
        self.form.clear_errors();
        let Some(request) = self.validate() else {
            return Vec::new();
        };

        match self.api.register(request).await.into_result() {
            Ok(_) => vec![
                Effect::Toast(Toast::success("Registration successful! Please log in.")),
                Effect::Navigate(LOGIN_ROUTE.to_string()),
            ],
            Err(e) => match translate(&e) {
                Feedback::Inline { message, fields } => {
                    self.form.server_errors(&message, &fields);
                    Vec::new()
                }
                Feedback::Toast(toast) | Feedback::SignIn(toast) => vec![Effect::Toast(toast)],
            },
        }
    }
}

#[async_trait]
impl Page for SignupPage {
    fn route(&self) -> &str {
        SIGNUP_ROUTE
    }

    fn render(&self) -> Screen {
        let mut screen = Screen::new(SIGNUP_ROUTE);
        screen.push(Element::new(selectors::PAGE_HEADING, "Create an account"));
        self.form.render(&mut screen);
        screen.push(Element::new(selectors::SIGNUP_BUTTON, "Sign Up"));
        screen.push(Element::new(selectors::nav_link("login"), "Already have an account? Login"));
        screen
    }

    fn type_into(&mut self, selector: &str, index: usize, value: &str) -> Result<(), UiError> {
        type_into_form(&mut self.form, selector, index, value)
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<Vec<Effect>, UiError> {
        match selector {
            selectors::SIGNUP_BUTTON => Ok(self.submit().await),
            _ => Err(no_such_element(selector, index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use crate::config::Config;

    fn signup() -> SignupPage {
        // 不可达的后端：任何真正发出的请求都会变成网络错误提示
        let state = AppState::new(Config::for_domain("http://127.0.0.1:9")).unwrap();
        SignupPage::new(state.api)
    }

    #[tokio::test]
    async fn mismatched_passwords_never_reach_the_backend() {
        let mut page = signup();
        page.type_into("full-name-input", 0, "Grace Hopper").unwrap();
        page.type_into("email-input", 0, "grace@careconnect.test").unwrap();
        page.type_into("password-input", 0, "Password123!").unwrap();
        page.type_into("confirm-password-input", 0, "Password321!").unwrap();

        let effects = page.click(selectors::SIGNUP_BUTTON, 0).await.unwrap();
        assert!(effects.is_empty());

        let screen = page.render();
        assert_eq!(screen.select("confirm-password-error")[0].text, "Passwords must match");
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let state = AppState::new(Config::for_domain("http://127.0.0.1:9")).unwrap();
        let mut page = LoginPage::new(state.api);
        page.type_into("email-input", 0, "admin@careconnect.test").unwrap();

        let effects = page.click(selectors::LOGIN_BUTTON, 0).await.unwrap();
        assert!(effects.is_empty());
        assert!(page.render().contains("Password is required"));
    }

    #[test]
    fn unknown_inputs_are_rejected() {
        let mut page = signup();
        assert!(page.type_into("search-input", 0, "x").is_err());
    }
}
