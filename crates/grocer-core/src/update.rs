//! # Partial Updates
//!
//! [`FieldUpdate`] distinguishes "leave this field alone" from "clear it"
//! from "set it to a value".
//!
//! ## JSON Mapping
//! ```text
//! { }                      → Unchanged
//! { "category_id": null }  → Clear
//! { "category_id": "c-1" } → Set("c-1")
//! ```
//!
//! Struct fields of this type must carry `#[serde(default)]` so that an absent
//! key deserializes to `Unchanged`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A single field of a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Keep the stored value.
    Unchanged,
    /// Remove the stored value (set the column to NULL).
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Unchanged
    }
}

impl<T> FieldUpdate<T> {
    /// Builds an update from a CLI-style pair: an optional new value and a
    /// "clear" flag. The flag wins when both are given.
    pub fn from_flags(value: Option<T>, clear: bool) -> Self {
        match (value, clear) {
            (_, true) => FieldUpdate::Clear,
            (Some(v), false) => FieldUpdate::Set(v),
            (None, false) => FieldUpdate::Unchanged,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldUpdate::Unchanged)
    }

    /// Returns the new value, if any.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            FieldUpdate::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldUpdate<U> {
        match self {
            FieldUpdate::Unchanged => FieldUpdate::Unchanged,
            FieldUpdate::Clear => FieldUpdate::Clear,
            FieldUpdate::Set(v) => FieldUpdate::Set(f(v)),
        }
    }

    /// Applies the update to a required (non-nullable) field.
    ///
    /// `Clear` is rejected with `ValidationError::Required`.
    pub fn resolve_required(self, field: &str, current: T) -> Result<T, ValidationError> {
        match self {
            FieldUpdate::Unchanged => Ok(current),
            FieldUpdate::Set(v) => Ok(v),
            FieldUpdate::Clear => Err(ValidationError::Required {
                field: field.to_string(),
            }),
        }
    }

    /// Applies the update to a nullable field.
    pub fn resolve_optional(self, current: Option<T>) -> Option<T> {
        match self {
            FieldUpdate::Unchanged => current,
            FieldUpdate::Clear => None,
            FieldUpdate::Set(v) => Some(v),
        }
    }
}

impl<'de, T> Deserialize<'de> for FieldUpdate<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => FieldUpdate::Set(v),
            None => FieldUpdate::Clear,
        })
    }
}

impl<T> Serialize for FieldUpdate<T>
where
    T: Serialize,
{
    /// `Unchanged` and `Clear` both serialize as `null`; skip unchanged
    /// fields with `skip_serializing_if = "FieldUpdate::is_unchanged"`.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_set().serialize(serializer)
    }
}
