use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::domain::{Answers, MarketingChannel, OwnerContact, PropertyRecord};

/// Payload produced by the manual-entry form or the public `/apply` flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default = "default_channel")]
    pub source: MarketingChannel,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub answers: Answers,
}

fn default_channel() -> MarketingChannel {
    MarketingChannel::Website
}

/// Inline message attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("intake validation failed: {}", describe(.fields))]
pub struct IntakeError {
    pub fields: Vec<FieldError>,
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|error| format!("{} {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn email_format() -> &'static Regex {
    static FORMAT: OnceLock<Regex> = OnceLock::new();
    FORMAT.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email format compiles"))
}

impl IntakeSubmission {
    /// Presence and format checks run before a lead is created.
    pub fn validate(&self) -> Result<(), IntakeError> {
        let mut fields = Vec::new();

        if self.first_name.trim().is_empty() {
            fields.push(FieldError {
                field: "first_name",
                message: "is required",
            });
        }
        if self.last_name.trim().is_empty() {
            fields.push(FieldError {
                field: "last_name",
                message: "is required",
            });
        }
        let email = self.email.trim();
        if email.is_empty() {
            fields.push(FieldError {
                field: "email",
                message: "is required",
            });
        } else if !email_format().is_match(email) {
            fields.push(FieldError {
                field: "email",
                message: "must be a valid email address",
            });
        }
        if self.phone.trim().is_empty() {
            fields.push(FieldError {
                field: "phone",
                message: "is required",
            });
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(IntakeError { fields })
        }
    }

    pub fn contact(&self) -> OwnerContact {
        OwnerContact {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}
