//! Input validation utilities.
//!
//! Field rules are declared with `validator` derives on the request forms;
//! everything that fails is collected into a [`FieldErrors`] map so a single
//! 422 response can report every problem at once.

use std::collections::BTreeMap;

use serde::Serialize;
use validator::{Validate, ValidationErrors};

use crate::error::ClinicError;

/// Field name → list of human-readable messages.
///
/// Ordered by field name so the "first" error is stable across requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding exactly one message.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// The first message of the first failing field.
    pub fn first(&self) -> Option<&str> {
        self.0.values().flatten().next().map(String::as_str)
    }

    /// `Ok(())` when nothing failed, otherwise a validation error carrying the map.
    pub fn into_result(self) -> Result<(), ClinicError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ClinicError::Validation { errors: self })
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = Self::new();
        for (field, errs) in errors.field_errors() {
            for e in errs.iter() {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {field} field is invalid."));
                out.add(&field, msg);
            }
        }
        out
    }
}

/// Run the declarative rules on a form and collect the failures.
///
/// Returns an empty map when the form is valid, so callers can append their
/// own checks (image rules, enum membership) before deciding.
pub fn collect_errors<T: Validate>(form: &T) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => e.into(),
    }
}

/// Normalise a submitted text value: trim it and treat blank input as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
