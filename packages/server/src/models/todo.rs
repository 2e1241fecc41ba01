use common::contract::{CreateTodoInput, UpdateTodoInput};

use crate::error::AppError;

/// Validate todo text: non-empty after trimming, at most 10000 characters.
pub fn validate_text(text: &str) -> Result<(), AppError> {
    let text = text.trim();
    if text.is_empty() || text.chars().count() > 10_000 {
        return Err(AppError::Validation(
            "Text must be 1-10000 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_todo(req: &CreateTodoInput) -> Result<(), AppError> {
    validate_text(&req.text)
}

pub fn validate_update_todo(req: &UpdateTodoInput) -> Result<(), AppError> {
    if let Some(ref text) = req.text {
        validate_text(text)?;
    }
    Ok(())
}

/// Whether the update changes nothing beyond addressing a row.
pub fn is_noop(req: &UpdateTodoInput) -> bool {
    req.text.is_none() && req.completed.is_none()
}
