// 无渲染的视图模型
// 只暴露 data-test 选择器、文本和可见性，供端到端流程驱动与断言

pub mod feedback;
pub mod form;
pub mod pages;
pub mod screen;
pub mod selectors;
pub mod toast;

use thiserror::Error;

pub use feedback::{Feedback, translate};
pub use form::Form;
pub use pages::{Effect, Page};
pub use screen::{Element, Screen};
pub use toast::{Toast, ToastKind, Toasts};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UiError {
    #[error("no element matches [data-test={selector}] (index {index})")]
    NoSuchElement { selector: String, index: usize },

    #[error("element [data-test={0}] cannot be typed into")]
    NotEditable(String),

    #[error("element [data-test={0}] is not clickable")]
    NotClickable(String),
}
