//! Form input types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::RegistryError;

/// A submitted form: the form name plus its named string fields
///
/// Fields arrive exactly as typed. Required-field checks trim surrounding
/// whitespace, so a field holding only spaces counts as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormInput {
    pub form: String,
    pub fields: HashMap<String, String>,
}

impl FormInput {
    /// Create a new, empty form submission
    pub fn new(form: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            fields: HashMap::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field only when a value is present
    pub fn with_optional_field(self, key: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => self.with_field(key, value),
            None => self,
        }
    }

    /// Get a required field, trimmed
    pub fn field_str(&self, key: &str) -> Result<String, RegistryError> {
        self.field_opt(key)
            .ok_or_else(|| RegistryError::MissingField(key.to_string()))
    }

    /// Get an optional field, trimmed; blank values count as absent
    pub fn field_opt(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(String::from)
    }
}
