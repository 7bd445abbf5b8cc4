//! Per-user MFA device bindings.
//!
//! A binding links one user to one provider. Attributes are free-form and
//! interpreted by the provider named in the binding; the Yubikey provider
//! reads the `device` attribute.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// One user's enrollment with one MFA provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfaConfig {
    /// Identifier of the provider this binding belongs to
    pub provider: String,
    /// Provider specific attributes
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl MfaConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a string attribute (builder style).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into(), Value::String(value.into()));
        self
    }

    /// Read an attribute as a string.
    ///
    /// Scalars (strings, numbers, booleans) are rendered as text. Missing
    /// attributes, nulls and nested structures yield `None`.
    pub fn attribute_string(&self, name: &str) -> Option<String> {
        match self.attributes.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
