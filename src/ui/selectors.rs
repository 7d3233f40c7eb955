// data-test 选择器

pub const PAGE_HEADING: &str = "page-heading";
pub const WELCOME_MESSAGE: &str = "welcome-message";

pub const EMAIL_INPUT: &str = "email-input";
pub const PASSWORD_INPUT: &str = "password-input";
pub const CONFIRM_PASSWORD_INPUT: &str = "confirm-password-input";
pub const FULL_NAME_INPUT: &str = "full-name-input";
pub const PHONE_INPUT: &str = "phone-input";
pub const LOGIN_BUTTON: &str = "login-button";
pub const SIGNUP_BUTTON: &str = "signup-button";
pub const LOGOUT_BUTTON: &str = "logout-button";
pub const FORM_ERROR: &str = "form-error";

pub const SEARCH_INPUT: &str = "search-input";
pub const CLEAR_FILTERS: &str = "clear-filters";
pub const NO_RESULTS: &str = "no-results";
pub const LOADING: &str = "loading";
pub const ERROR_MESSAGE: &str = "error-message";

pub const CREATE_FORM: &str = "create-form";
pub const SUBMIT_BUTTON: &str = "submit-button";
pub const CANCEL_BUTTON: &str = "cancel-button";

pub const UPDATE_MODAL: &str = "update-modal";
pub const UPDATE_BUTTON: &str = "update-button";
pub const CLOSE_MODAL_BUTTON: &str = "close-modal-button";

pub const DELETE_MODAL: &str = "delete-modal";
pub const CONFIRM_DELETE_BUTTON: &str = "confirm-delete-button";
pub const CANCEL_DELETE_BUTTON: &str = "cancel-delete-button";

pub const PROFILE_NAME: &str = "profile-name";
pub const PROFILE_EMAIL: &str = "profile-email";
pub const PROFILE_ROLE: &str = "profile-role";

pub const APPOINTMENT_COUNT: &str = "appointment-count";

pub fn input(field: &str) -> String {
    format!("{field}-input")
}

pub fn field_error(field: &str) -> String {
    format!("{field}-error")
}

pub fn row(singular: &str) -> String {
    format!("{singular}-row")
}

pub fn name(singular: &str) -> String {
    format!("{singular}-name")
}

pub fn add_button(singular: &str) -> String {
    format!("add-{singular}-button")
}

pub fn edit_button(singular: &str) -> String {
    format!("edit-{singular}-button")
}

pub fn delete_button(singular: &str) -> String {
    format!("delete-{singular}-button")
}

pub fn nav_link(section: &str) -> String {
    format!("nav-{section}")
}

/// 输入框选择器对应的字段名
pub fn field_of(selector: &str) -> Option<&str> {
    selector.strip_suffix("-input")
}
