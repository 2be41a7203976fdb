//! Form validation.
//!
//! A [`Form`] is an ordered list of fields. [`validate`] checks every required
//! field, attaches at most one message to each failing field, and clears the
//! message on fields that now pass.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

pub const REQUIRED: &str = "This field is required";
pub const INVALID_EMAIL: &str = "Please enter a valid email";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Single `@`, no whitespace, and a dot in the domain part.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Length is counted in UTF-16 code units, as browser form fields count it.
pub fn password_too_short(password: &str) -> bool {
    password.encode_utf16().count() < MIN_PASSWORD_LEN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    TextArea,
    Select,
}

impl FieldKind {
    /// Guess the input type from a field name, for forms typed at the shell.
    pub fn infer(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("email") {
            Self::Email
        } else if name.contains("password") {
            Self::Password
        } else if name == "message" || name == "body" {
            Self::TextArea
        } else if name == "subject" || name == "category" || name == "topic" {
            Self::Select
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
    error: Option<String>,
}

impl Field {
    pub fn new(name: &str, kind: FieldKind, value: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value: value.to_string(),
            required: true,
            error: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn check(&self) -> Option<&'static str> {
        if self.value.trim().is_empty() {
            return Some(REQUIRED);
        }
        match self.kind {
            FieldKind::Email if !is_valid_email(&self.value) => Some(INVALID_EMAIL),
            FieldKind::Password if password_too_short(&self.value) => Some(PASSWORD_TOO_SHORT),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Form {
    pub fields: Vec<Field>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Build a form of required fields from `name=value` pairs, kinds inferred.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| Field::new(k.as_ref(), FieldKind::infer(k.as_ref()), v.as_ref()))
            .collect();
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }

    /// `(field, message)` for every field currently carrying a message.
    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .filter_map(|f| f.error().map(|e| (f.name.as_str(), e)))
            .collect()
    }

    pub fn values(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }
}

/// Validate every required field; true only if all pass.
pub fn validate(form: &mut Form) -> bool {
    let mut valid = true;
    for field in form.fields.iter_mut().filter(|f| f.required) {
        field.error = field.check().map(str::to_string);
        if field.error.is_some() {
            valid = false;
        }
    }
    valid
}

/// Result of submitting a form that must validate first.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome<T> {
    Rejected,
    Accepted(T),
}

impl<T> FormOutcome<T> {
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Rejected => None,
        }
    }
}
