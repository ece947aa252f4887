// ── Three-state optional attribute ──
//
// The load-balancing API distinguishes "not provided" from "explicitly
// cleared". Create and sync substitute defaults for unset attributes;
// update omits them entirely.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// An attribute that may be unset, explicitly null, or carry a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Not provided by the caller.
    Unset,
    /// Explicitly cleared.
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unset | Self::Null => None,
        }
    }
}

impl<T: Clone> Field<T> {
    /// The value, or `default` when unset. Null stays null.
    pub fn or_default_when_unset(&self, default: T) -> Option<T> {
        match self {
            Self::Unset => Some(default),
            Self::Null => None,
            Self::Value(v) => Some(v.clone()),
        }
    }
}

impl Field<String> {
    /// The value when it is a non-empty string.
    pub fn non_empty(&self) -> Option<&str> {
        self.as_option().map(String::as_str).filter(|s| !s.is_empty())
    }
}

impl<T> Field<Vec<T>> {
    /// Children as a slice; unset and null both read as empty.
    pub fn items(&self) -> &[T] {
        self.as_option().map_or(&[], Vec::as_slice)
    }
}

impl<T: Serialize> Field<T> {
    /// JSON form for a request attribute. Unset and null both become `null`.
    pub fn to_json(&self) -> Value {
        self.as_option()
            .and_then(|v| serde_json::to_value(v).ok())
            .unwrap_or(Value::Null)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Unset | Self::Null => serializer.serialize_none(),
        }
    }
}
