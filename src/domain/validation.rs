//! Field-level validation errors shared by every entity

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "has already been taken";
pub const MUST_EXIST: &str = "must exist";
pub const INVALID: &str = "is invalid";

/// Ordered map of field name to the messages raised against it
///
/// Fields keep the order in which their first error was added, so the
/// serialized body is stable for a given set of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set holding a single message
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();

        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field, vec![message])),
        }
    }

    /// Record "can't be blank" when the value is missing or whitespace only
    pub fn require(&mut self, field: &str, value: Option<&str>) {
        if is_blank(value) {
            self.add(field, BLANK);
        }
    }

    /// Merge another set into this one
    pub fn extend(&mut self, other: ValidationErrors) {
        for (field, messages) in other.fields {
            for message in messages {
                self.add(field.clone(), message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages raised against one field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// Human readable sentences, one per message
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(field, messages)| {
                messages.iter().map(move |message| format!("{} {}", field, message))
            })
            .collect()
    }

    /// Turn the collected errors into a result
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;

        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }

        map.end()
    }
}

/// Blank means absent, empty, or only whitespace
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
