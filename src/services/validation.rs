//! Local form checks, run before any remote call

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Largest accepted profile picture (5 MiB)
pub const MAX_PROFILE_PICTURE_BYTES: usize = 5 * 1024 * 1024;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill all the fields!")]
    MissingFields,

    #[error("Invalid email format!")]
    InvalidEmailFormat,

    #[error("Passwords do not match!")]
    PasswordMismatch,

    #[error("Please select an image before uploading")]
    NoImage,

    #[error(
        "Image size is too large. Please select an image under {}.",
        size_label(.max_bytes)
    )]
    ImageTooLarge { max_bytes: usize },
}

/// Human-readable size cap, e.g. `5MB`
fn size_label(bytes: &usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;
    match *bytes {
        b if b >= MIB && b % MIB == 0 => format!("{}MB", b / MIB),
        b if b >= KIB && b % KIB == 0 => format!("{}KB", b / KIB),
        b => format!("{} bytes", b),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmailFormat);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty()
            || self.password.is_empty()
            || self.username.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmailFormat);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

/// Checks an image payload against the size cap
pub fn validate_image(bytes: &[u8], max_bytes: usize) -> Result<(), ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::NoImage);
    }
    if bytes.len() > max_bytes {
        return Err(ValidationError::ImageTooLarge { max_bytes });
    }
    Ok(())
}
