use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveTime;

use crate::ui::screen::{Element, Screen};
use crate::ui::selectors;

/// 表单字段值与字段级错误
///
/// 字段名即输入框选择器去掉 `-input` 后缀，例如 `doctor-id`。
#[derive(Debug, Clone, Default)]
pub struct Form {
    order: Vec<String>,
    values: BTreeMap<String, String>,
    errors: BTreeMap<String, String>,
    message: Option<String>,
}

impl Form {
    pub fn with_fields(fields: &[&str]) -> Self {
        let mut form = Self::default();
        for field in fields {
            form.order.push(field.to_string());
            form.values.insert(field.to_string(), String::new());
        }
        form
    }

    /// 预填的字段
    pub fn prefilled(fields: &[(&str, String)]) -> Self {
        let mut form = Self::default();
        for (field, value) in fields {
            form.order.push(field.to_string());
            form.values.insert(field.to_string(), value.clone());
        }
        form
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// 输入；字段不存在时返回 false
    pub fn set(&mut self, field: &str, value: &str) -> bool {
        match self.values.get_mut(field) {
            Some(slot) => {
                *slot = value.to_string();
                self.errors.remove(field);
                true
            }
            None => false,
        }
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(|v| v.trim()).unwrap_or_default()
    }

    /// 非空时返回值
    pub fn optional(&self, field: &str) -> Option<String> {
        let value = self.value(field);
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn required(&mut self, field: &str, label: &str) -> Option<String> {
        let value = self.optional(field);
        if value.is_none() {
            self.reject(field, &format!("{label} is required"));
        }
        value
    }

    pub fn parse<T: FromStr>(&mut self, field: &str, label: &str) -> Option<T> {
        let raw = self.required(field, label)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.reject(field, &format!("{label} is invalid"));
                None
            }
        }
    }

    /// 留空视为不修改；格式错误记为字段错误
    pub fn parse_optional<T: FromStr>(&mut self, field: &str, label: &str) -> Option<T> {
        let raw = self.optional(field)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.reject(field, &format!("{label} is invalid"));
                None
            }
        }
    }

    /// `HH:MM` 或 `HH:MM:SS`
    pub fn time(&mut self, field: &str, label: &str, required: bool) -> Option<NaiveTime> {
        let raw = if required {
            self.required(field, label)?
        } else {
            self.optional(field)?
        };
        match NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        {
            Ok(time) => Some(time),
            Err(_) => {
                self.reject(field, &format!("{label} is invalid"));
                None
            }
        }
    }

    pub fn reject(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
        self.message = None;
    }

    /// 后端返回的字段错误，键为 camelCase
    pub fn server_errors(&mut self, message: &str, fields: &BTreeMap<String, String>) {
        self.message = Some(message.to_string());
        for (field, error) in fields {
            self.errors.insert(kebab_case(field), error.clone());
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn render(&self, screen: &mut Screen) {
        for field in &self.order {
            screen.push(Element::input(selectors::input(field), self.value(field)));
            if let Some(error) = self.errors.get(field) {
                screen.push(Element::new(selectors::field_error(field), error.as_str()));
            }
        }
        // 没有对应输入框的错误
        for (field, error) in &self.errors {
            if !self.values.contains_key(field) {
                screen.push(Element::new(selectors::FORM_ERROR, error.as_str()));
            }
        }
        if let Some(message) = &self.message {
            screen.push(Element::new(selectors::FORM_ERROR, message.as_str()));
        }
    }
}

pub fn kebab_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_and_parsed_fields_record_errors() {
        let mut form = Form::with_fields(&["amount", "date"]);
        form.set("amount", "abc");

        assert_eq!(form.parse::<f64>("amount", "Amount"), None);
        assert_eq!(form.required("date", "Date"), None);
        assert_eq!(form.error("amount"), Some("Amount is invalid"));
        assert_eq!(form.error("date"), Some("Date is required"));

        form.set("amount", "120.5");
        assert_eq!(form.error("amount"), None);
        assert_eq!(form.parse::<f64>("amount", "Amount"), Some(120.5));
    }

    #[test]
    fn unknown_fields_are_not_editable() {
        let mut form = Form::with_fields(&["email"]);
        assert!(!form.set("password", "secret"));
    }

    #[test]
    fn server_field_names_map_to_inputs() {
        let mut form = Form::with_fields(&["doctor-id"]);
        let mut fields = BTreeMap::new();
        fields.insert("doctorId".to_string(), "Doctor does not exist".to_string());
        form.server_errors("Invalid appointment", &fields);

        let mut screen = Screen::new("/");
        form.render(&mut screen);
        assert_eq!(screen.select("doctor-id-error")[0].text, "Doctor does not exist");
        assert_eq!(screen.select(selectors::FORM_ERROR)[0].text, "Invalid appointment");
    }

    #[test]
    fn times_accept_minutes_precision() {
        let mut form = Form::with_fields(&["time"]);
        form.set("time", "14:30");
        assert_eq!(
            form.time("time", "Time", true),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
    }
}
