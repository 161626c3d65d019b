//! Defines observatory identifiers and the reference rows that tie address areas to
//! observatories.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of an AMeDAS observatory, also the join key of the daily table, where
/// observatories are keyed by name, e.g. `"東京"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservatoryId(pub String);

impl ObservatoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObservatoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObservatoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ObservatoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ObservatoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One row of the observatory reference dataset.
///
/// `canonical_address_prefix` is the address area served by the observatory, e.g.
/// `"東京都千代田区"`. It is normalized again when the index is built, so legacy
/// spellings in the reference data are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservatoryReference {
    pub observatory_id: ObservatoryId,
    pub canonical_address_prefix: String,
    pub display_name: String,
}

impl ObservatoryReference {
    /// Creates a reference whose display name equals its id.
    pub fn new(observatory_id: impl Into<ObservatoryId>, prefix: impl Into<String>) -> Self {
        let observatory_id = observatory_id.into();
        Self {
            display_name: observatory_id.0.clone(),
            observatory_id,
            canonical_address_prefix: prefix.into(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}
