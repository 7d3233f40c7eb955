//! 通用资源列表页：列表、搜索、新建表单、更新弹窗、删除确认

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::api::{Api, Change, Create, Delete, List, QuerySubscription, Resource, Update};
use crate::error::ApiError;
use crate::session::Session;
use crate::ui::UiError;
use crate::ui::feedback::{Feedback, translate};
use crate::ui::form::Form;
use crate::ui::pages::{Effect, Page, no_such_element};
use crate::ui::screen::{Element, Screen};
use crate::ui::selectors;
use crate::ui::toast::Toast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl Capabilities {
    pub const FULL: Self = Self { create: true, update: true, delete: true };
    pub const MANAGE: Self = Self { create: false, update: true, delete: true };
    pub const BOOK: Self = Self { create: true, update: false, delete: true };
    pub const EDIT_ONLY: Self = Self { create: false, update: true, delete: false };
    pub const REMOVE_ONLY: Self = Self { create: false, update: false, delete: true };
    pub const CREATE_ONLY: Self = Self { create: true, update: false, delete: false };
    pub const READ_ONLY: Self = Self { create: false, update: false, delete: false };
}

/// 资源在列表页上的展示方式与表单映射
pub trait ResourceView: Resource<Model = Self> + Clone + DeserializeOwned {
    /// 单数标签，如 `Doctor`
    const LABEL: &'static str;

    fn title(&self) -> String;

    fn summary(&self) -> String;

    /// 搜索匹配的文本
    fn search_text(&self) -> String {
        self.title()
    }

    fn create_fields() -> &'static [&'static str];

    /// 字段错误记录在表单中
    fn draft_from_form(form: &mut Form, session: &Session) -> Option<Self::Draft>;

    fn edit_form(&self) -> Form;

    fn patch_from_form(form: &mut Form) -> Option<Self::Patch>;

    fn created_message() -> String {
        format!("{} added successfully!", Self::LABEL)
    }

    fn updated_message() -> String {
        format!("{} updated successfully!", Self::LABEL)
    }

    fn deleted_message() -> String {
        format!("{} deleted successfully", Self::LABEL)
    }
}

enum Target {
    Create,
    Update,
}

pub struct ResourcePage<V: ResourceView> {
    route: String,
    api: Api,
    session: Session,
    capabilities: Capabilities,
    list: QuerySubscription<Vec<V>>,
    search: String,
    create: Option<Form>,
    editing: Option<(i64, Form)>,
    deleting: Option<i64>,
}

impl<V: ResourceView> ResourcePage<V> {
    pub fn new(route: &str, api: &Api, session: Session, capabilities: Capabilities) -> Self {
        Self {
            route: route.to_string(),
            list: api.subscribe(&List::<V>::new(), ()),
            api: api.clone(),
            session,
            capabilities,
            search: String::new(),
            create: None,
            editing: None,
            deleting: None,
        }
    }

    fn heading() -> String {
        let mut chars = V::PLURAL.chars();
        match chars.next() {
            Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => String::new(),
        }
    }

    /// 按搜索词过滤后的行
    pub fn rows(&self) -> Vec<V> {
        let needle = self.search.trim().to_lowercase();
        self.list
            .current()
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|model| needle.is_empty() || model.search_text().to_lowercase().contains(&needle))
            .collect()
    }

    fn row_at(&self, selector: &str, index: usize) -> Result<V, UiError> {
        self.rows()
            .into_iter()
            .nth(index)
            .ok_or_else(|| no_such_element(selector, index))
    }

    fn open_form(&mut self) -> Option<&mut Form> {
        match (&mut self.editing, &mut self.create) {
            (Some((_, form)), _) => Some(form),
            (None, Some(form)) => Some(form),
            (None, None) => None,
        }
    }

    fn failed(&mut self, error: ApiError, target: Target) -> Vec<Effect> {
        match translate(&error) {
            Feedback::Inline { message, fields } => {
                let form = match target {
                    Target::Create => self.create.as_mut(),
                    Target::Update => self.editing.as_mut().map(|(_, form)| form),
                };
                if let Some(form) = form {
                    form.server_errors(&message, &fields);
                }
                Vec::new()
            }
            Feedback::Toast(toast) | Feedback::SignIn(toast) => vec![Effect::Toast(toast)],
        }
    }

    async fn submit_create(&mut self) -> Result<Vec<Effect>, UiError> {
        let Some(form) = self.create.as_mut() else {
            return Err(no_such_element(selectors::SUBMIT_BUTTON, 0));
        };
        form.clear_errors();
        let draft = V::draft_from_form(form, &self.session);
        let Some(draft) = draft.filter(|_| form.is_valid()) else {
            return Ok(Vec::new());
        };

        match self.api.mutate(&Create::<V>::new(), draft).await.into_result() {
            Ok(_) => {
                self.create = None;
                Ok(vec![Effect::Toast(Toast::success(V::created_message()))])
            }
            Err(e) => Ok(self.failed(e, Target::Create)),
        }
    }

    async fn submit_update(&mut self) -> Result<Vec<Effect>, UiError> {
        let Some((id, form)) = self.editing.as_mut() else {
            return Err(no_such_element(selectors::UPDATE_BUTTON, 0));
        };
        form.clear_errors();
        let patch = V::patch_from_form(form);
        let Some(patch) = patch.filter(|_| form.is_valid()) else {
            return Ok(Vec::new());
        };

        let change = Change { id: *id, patch };
        match self.api.mutate(&Update::<V>::new(), change).await.into_result() {
            Ok(_) => {
                self.editing = None;
                Ok(vec![Effect::Toast(Toast::success(V::updated_message()))])
            }
            Err(e) => Ok(self.failed(e, Target::Update)),
        }
    }

    async fn confirm_delete(&mut self) -> Result<Vec<Effect>, UiError> {
        let Some(id) = self.deleting else {
            return Err(no_such_element(selectors::CONFIRM_DELETE_BUTTON, 0));
        };

        let result = self.api.mutate(&Delete::<V>::new(), id).await;
        self.deleting = None;
        match result.into_result() {
            Ok(_) => Ok(vec![Effect::Toast(Toast::success(V::deleted_message()))]),
            Err(e) => Ok(match translate(&e) {
                Feedback::Inline { message, .. } => vec![Effect::Toast(Toast::error(message))],
                Feedback::Toast(toast) | Feedback::SignIn(toast) => vec![Effect::Toast(toast)],
            }),
        }
    }
}

#[async_trait]
impl<V: ResourceView> Page for ResourcePage<V> {
    fn route(&self) -> &str {
        &self.route
    }

    fn render(&self) -> Screen {
        let mut screen = Screen::new(&self.route);
        screen.push(Element::new(selectors::PAGE_HEADING, Self::heading()));
        if self.capabilities.create {
            screen.push(Element::new(
                selectors::add_button(V::SINGULAR),
                format!("Add {}", V::LABEL),
            ));
        }
        screen.push(Element::input(selectors::SEARCH_INPUT, &self.search));

        let result = self.list.current();
        if result.data.is_none() && !result.is_error() {
            screen.push(Element::new(selectors::LOADING, format!("Loading {}...", V::PLURAL)));
        }
        // 出错时仍展示上次成功的数据
        if let Some(error) = &result.error {
            screen.push(Element::new(selectors::ERROR_MESSAGE, error.user_message()));
        }

        let rows = self.rows();
        for model in &rows {
            screen.push(Element::new(selectors::row(V::SINGULAR), model.summary()));
            screen.push(Element::new(selectors::name(V::SINGULAR), model.title()));
            if self.capabilities.update {
                screen.push(Element::new(selectors::edit_button(V::SINGULAR), "Edit"));
            }
            if self.capabilities.delete {
                screen.push(Element::new(selectors::delete_button(V::SINGULAR), "Delete"));
            }
        }
        if result.data.is_some() && rows.is_empty() {
            screen.push(Element::new(selectors::NO_RESULTS, format!("No {} found", V::PLURAL)));
            if !self.search.trim().is_empty() {
                screen.push(Element::new(selectors::CLEAR_FILTERS, "Clear Filters"));
            }
        }

        if let Some(form) = &self.create {
            screen.push(Element::new(selectors::CREATE_FORM, format!("Add {}", V::LABEL)));
            form.render(&mut screen);
            screen.push(Element::new(selectors::SUBMIT_BUTTON, "Save"));
            screen.push(Element::new(selectors::CANCEL_BUTTON, "Cancel"));
        }
        if let Some((_, form)) = &self.editing {
            screen.push(Element::new(selectors::UPDATE_MODAL, format!("Update {}", V::LABEL)));
            form.render(&mut screen);
            screen.push(Element::new(selectors::UPDATE_BUTTON, "Update"));
            screen.push(Element::new(selectors::CLOSE_MODAL_BUTTON, "Close"));
        }
        if self.deleting.is_some() {
            screen.push(Element::new(
                selectors::DELETE_MODAL,
                format!("Are you sure you want to delete this {}?", V::SINGULAR),
            ));
            screen.push(Element::new(selectors::CONFIRM_DELETE_BUTTON, "Delete"));
            screen.push(Element::new(selectors::CANCEL_DELETE_BUTTON, "Cancel"));
        }
        screen
    }

    fn type_into(&mut self, selector: &str, index: usize, value: &str) -> Result<(), UiError> {
        if selector == selectors::SEARCH_INPUT {
            self.search = value.to_string();
            return Ok(());
        }
        let field = selectors::field_of(selector).ok_or_else(|| UiError::NotEditable(selector.to_string()))?;
        match self.open_form() {
            Some(form) => {
                if form.set(field, value) {
                    Ok(())
                } else {
                    Err(no_such_element(selector, index))
                }
            }
            None => Err(no_such_element(selector, index)),
        }
    }

    async fn click(&mut self, selector: &str, index: usize) -> Result<Vec<Effect>, UiError> {
        let singular = V::SINGULAR;
        match selector {
            s if s == selectors::add_button(singular) && self.capabilities.create => {
                self.editing = None;
                self.create = Some(Form::with_fields(V::create_fields()));
                Ok(Vec::new())
            }
            s if s == selectors::edit_button(singular) && self.capabilities.update => {
                let model = self.row_at(selector, index)?;
                self.create = None;
                self.editing = Some((V::id(&model), model.edit_form()));
                Ok(Vec::new())
            }
            s if s == selectors::delete_button(singular) && self.capabilities.delete => {
                let model = self.row_at(selector, index)?;
                self.deleting = Some(V::id(&model));
                Ok(Vec::new())
            }
            selectors::SUBMIT_BUTTON => self.submit_create().await,
            selectors::UPDATE_BUTTON => self.submit_update().await,
            selectors::CONFIRM_DELETE_BUTTON => self.confirm_delete().await,
            selectors::CANCEL_BUTTON if self.create.is_some() => {
                self.create = None;
                Ok(Vec::new())
            }
            selectors::CLOSE_MODAL_BUTTON if self.editing.is_some() => {
                self.editing = None;
                Ok(Vec::new())
            }
            selectors::CANCEL_DELETE_BUTTON if self.deleting.is_some() => {
                self.deleting = None;
                Ok(Vec::new())
            }
            selectors::CLEAR_FILTERS if !self.search.is_empty() => {
                self.search.clear();
                Ok(Vec::new())
            }
            _ => Err(no_such_element(selector, index)),
        }
    }

    async fn settle(&mut self) {
        self.list.settled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use crate::api::models::Service;
    use crate::config::Config;

    #[tokio::test]
    async fn typing_fills_the_open_form_only() {
        // 访客会话下列表在本地即被拒绝，不会发出请求
        let state = AppState::new(Config::for_domain("http://127.0.0.1:9")).unwrap();
        let mut page = ResourcePage::<Service>::new(
            "/admin/dashboard/services",
            &state.api,
            Session::guest(),
            Capabilities::FULL,
        );

        let closed = page.type_into("title-input", 0, "Physiotherapy");
        assert!(matches!(closed, Err(UiError::NoSuchElement { .. })));

        page.click(&selectors::add_button("service"), 0).await.unwrap();
        page.type_into("title-input", 0, "Physiotherapy").unwrap();
        let unknown = page.type_into("colour-input", 0, "red");
        assert!(matches!(unknown, Err(UiError::NoSuchElement { .. })));

        let screen = page.render();
        assert_eq!(
            screen.select("title-input")[0].value.as_deref(),
            Some("Physiotherapy")
        );
    }
}
