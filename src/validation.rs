//! Client-side form checks.
//!
//! These run before any request is built and only fast-fail obvious input
//! mistakes; the backend remains the authority and its rejection messages are
//! shown as they arrive.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

pub const MOBILE_PATTERN: &str = r"^\+?[1-9][0-9]{1,14}$";
pub const UPLOAD_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

static MOBILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MOBILE_PATTERN).expect("mobile pattern compiles"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern compiles")
});

const NAME_MIN: usize = 2;
const PASSWORD_MIN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Mobile,
    Password,
    ConfirmPassword,
    File,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Mobile => "Mobile",
            Field::Password => "Password",
            Field::ConfirmPassword => "Confirm Password",
            Field::File => "File",
        }
    }
}

/// A single failed check, scoped to one field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every failed check of one form submission, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|err| err.field == field)
            .map(|err| err.message.as_str())
    }

    /// Records the outcome of a check; passing checks are dropped.
    pub fn check(&mut self, outcome: Result<(), FieldError>) {
        if let Err(err) = outcome {
            self.errors.push(err);
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn validate_name(name: &str) -> Result<(), FieldError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FieldError::new(Field::Name, "Name is required"));
    }
    if name.chars().count() < NAME_MIN {
        return Err(FieldError::new(
            Field::Name,
            "Name must be at least 2 characters",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(FieldError::new(Field::Email, "Email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(FieldError::new(Field::Email, "Invalid email address"));
    }
    Ok(())
}

pub fn validate_mobile(mobile: &str) -> Result<(), FieldError> {
    let mobile = mobile.trim();
    if mobile.is_empty() {
        return Err(FieldError::new(Field::Mobile, "Mobile number is required"));
    }
    if !MOBILE_RE.is_match(mobile) {
        return Err(FieldError::new(Field::Mobile, "Mobile number must be valid"));
    }
    Ok(())
}

/// Password rules for account registration and agent creation.
pub fn validate_new_password(password: &str) -> Result<(), FieldError> {
    if password.is_empty() {
        return Err(FieldError::new(Field::Password, "Password is required"));
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(FieldError::new(
            Field::Password,
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

/// Login only needs something to send.
pub fn validate_login_password(password: &str) -> Result<(), FieldError> {
    if password.is_empty() {
        return Err(FieldError::new(Field::Password, "Password is required"));
    }
    Ok(())
}

pub fn validate_confirmation(password: &str, confirm: &str) -> Result<(), FieldError> {
    if confirm.is_empty() {
        return Err(FieldError::new(
            Field::ConfirmPassword,
            "Please confirm your password",
        ));
    }
    if password != confirm {
        return Err(FieldError::new(
            Field::ConfirmPassword,
            "Passwords must match",
        ));
    }
    Ok(())
}

/// Extension check run before an upload is transferred.
pub fn validate_upload_path(path: &Path) -> Result<(), FieldError> {
    if path.as_os_str().is_empty() {
        return Err(FieldError::new(Field::File, "File is required"));
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension {
        Some(ext) if UPLOAD_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(FieldError::new(
            Field::File,
            "Unsupported format. Only CSV, XLSX and XLS files are allowed",
        )),
    }
}
