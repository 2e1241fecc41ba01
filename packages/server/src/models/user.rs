use common::contract::{CreateUserInput, UpdateUserInput};

use crate::error::AppError;

const MAX_NAME_CHARS: usize = 256;
const MAX_EMAIL_CHARS: usize = 320;

/// Validate a trimmed display name (1-256 Unicode characters).
pub fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation("Name must be 1-256 characters".into()));
    }
    Ok(())
}

/// Minimal structural e-mail check: `local@domain.tld`, no whitespace.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::Validation(format!("'{email}' is not a valid email address"));

    if email.chars().count() > MAX_EMAIL_CHARS || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_create_user(req: &CreateUserInput) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_email(&req.email)
}

pub fn validate_update_user(req: &UpdateUserInput) -> Result<(), AppError> {
    if req.name.is_none() && req.email.is_none() {
        return Err(AppError::Validation(
            "At least one of name or email must be provided".into(),
        ));
    }
    if let Some(ref name) = req.name {
        validate_name(name)?;
    }
    if let Some(ref email) = req.email {
        validate_email(email)?;
    }
    Ok(())
}
