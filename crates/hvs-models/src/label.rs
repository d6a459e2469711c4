//! Helmet classification of raw detector labels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Helmet state carried by one detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HelmetClass {
    /// Helmet present
    Helmet,
    /// Helmet absent
    NoHelmet,
    /// Label says nothing about helmets; contributes to no counts
    Ignored,
}

impl HelmetClass {
    /// Map a detector class label onto a helmet class.
    ///
    /// Matching is case-insensitive on substrings and checked in order: a
    /// label with `helmet` and no `no` is a helmet; otherwise `no` or
    /// `without` means a missing helmet; anything else is ignored.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("helmet") && !label.contains("no") {
            HelmetClass::Helmet
        } else if label.contains("no") || label.contains("without") {
            HelmetClass::NoHelmet
        } else {
            HelmetClass::Ignored
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HelmetClass::Helmet => "helmet",
            HelmetClass::NoHelmet => "no_helmet",
            HelmetClass::Ignored => "ignored",
        }
    }

    pub fn is_counted(&self) -> bool {
        !matches!(self, HelmetClass::Ignored)
    }
}

impl fmt::Display for HelmetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
