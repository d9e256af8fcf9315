//! Strongly-typed identifiers.
//!
//! Identifiers are ULIDs (Universally Unique Lexicographically Sortable
//! Identifiers): random, and ordered by creation time when compared as
//! strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Identifier of a short-lived OAuth state session.
///
/// Displays as `state_<ulid>`, which is also the key the state session is
/// stored under. The bare ULID is what travels through the OAuth `state`
/// parameter; [`FromStr`] accepts either form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(Ulid);

impl StateId {
    const PREFIX: &'static str = "state";

    /// Creates a new ID with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Returns the ULID without the `state_` prefix.
    #[must_use]
    pub fn bare(&self) -> String {
        self.0.to_string()
    }

    /// Returns the key-value store key for this state session.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl Default for StateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}

impl FromStr for StateId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid_str = s
            .strip_prefix(Self::PREFIX)
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(s);

        Ulid::from_str(ulid_str)
            .map(Self)
            .map_err(|e| ParseIdError {
                id_type: "StateId",
                reason: e.to_string(),
            })
    }
}
