//! Form payloads and their validation.
//!
//! Validation errors are catalog keys, rendered next to the offending field.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use serde::Deserialize;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Field name -> catalog key of its error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, &'static str>);

impl FormErrors {
    pub fn insert(&mut self, field: &'static str, key: &'static str) {
        self.0.entry(field).or_insert(key);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        let email = self.email.trim();
        if email.is_empty() {
            errors.insert("email", "Login.emailRequired");
        } else if !is_login_email(email) {
            errors.insert("email", "Login.emailInvalid");
        }
        if self.password.is_empty() {
            errors.insert("password", "Login.passwordRequired");
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        if self.name.trim().is_empty() {
            errors.insert("name", "Register.errors.nameRequired");
        }

        if self.email.is_empty() {
            errors.insert("email", "Register.errors.emailRequired");
        } else if !is_register_email(&self.email) {
            errors.insert("email", "Register.errors.emailInvalid");
        }

        if self.password.is_empty() {
            errors.insert("password", "Register.errors.passwordRequired");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert("password", "Register.errors.passwordTooShort");
        }

        if self.confirm_password.is_empty() {
            errors.insert("confirmPassword", "Register.errors.confirmPasswordRequired");
        } else if self.password != self.confirm_password {
            errors.insert("confirmPassword", "Register.errors.passwordsDoNotMatch");
        }

        errors
    }
}

/// Whole value is `non-space+ @ non-space+`.
static LOGIN_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+$").expect("login email pattern"));

/// Contains `non-space+ @ non-space+ . non-space+` somewhere.
static REGISTER_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("register email pattern"));

fn is_login_email(value: &str) -> bool {
    LOGIN_EMAIL_REGEX.is_match(value)
}

fn is_register_email(value: &str) -> bool {
    REGISTER_EMAIL_REGEX.is_match(value)
}
