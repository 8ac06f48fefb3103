use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, FieldError};
use crate::validation::is_valid_email;

const MAX_MESSAGE_CHARS: usize = 5000;
const CATEGORIES: [&str; 4] = ["service", "technical", "privacy", "other"];

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: Option<String>,
    #[schema(example = "hanako@example.com")]
    pub email: Option<String>,
    #[schema(example = "service")]
    pub category: Option<String>,
    pub message: Option<String>,
}

/// A contact form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub category: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(self) -> Result<ContactSubmission, AppError> {
        let mut errors = Vec::new();

        let name = required(&mut errors, "name", self.name);
        let email = required(&mut errors, "email", self.email);
        let category = required(&mut errors, "category", self.category);
        let message = required(&mut errors, "message", self.message);

        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.push(FieldError::new("email", "invalid email address"));
            }
        }
        if let Some(category) = &category {
            if !CATEGORIES.contains(&category.as_str()) {
                errors.push(FieldError::new(
                    "category",
                    format!("allowed values: {}", CATEGORIES.join(", ")),
                ));
            }
        }
        if let Some(message) = &message {
            if message.chars().count() > MAX_MESSAGE_CHARS {
                errors.push(FieldError::new(
                    "message",
                    format!("must be at most {MAX_MESSAGE_CHARS} characters"),
                ));
            }
        }

        match (name, email, category, message) {
            (Some(name), Some(email), Some(category), Some(message)) if errors.is_empty() => Ok(ContactSubmission {
                name,
                email,
                category,
                message,
            }),
            _ => Err(AppError::validation(errors)),
        }
    }
}

fn required(errors: &mut Vec<FieldError>, field: &str, value: Option<String>) -> Option<String> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(value) => Some(value),
        None => {
            errors.push(FieldError::new(field, "required"));
            None
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub message: String,
    pub contact_id: String,
}
