//! Identifier types used throughout boardsync.
//!
//! Production uids are UUID v7 strings (time-ordered, globally unique).
//! Dev/test sessions use a sequential counter so that generated records
//! are deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Unique identifier of a replicated entity.
///
/// Kept as an opaque string on the wire: peers may mint uids in either
/// mode, and the engine only ever compares them for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Creates a new time-ordered uid.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wraps an existing identifier string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a uid, rejecting empty or whitespace-only strings.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s.trim().is_empty() {
            return Err(crate::Error::InvalidUid(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl Default for Uid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Uid {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a [`UidGenerator`] mints identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UidMode {
    /// UUID v7 strings.
    #[default]
    TimeOrdered,
    /// `"1"`, `"2"`, ... for deterministic output.
    Sequential,
}

/// Mints uids for locally created entities.
///
/// One generator belongs to one session; there is no process-wide counter.
#[derive(Debug)]
pub struct UidGenerator {
    mode: UidMode,
    counter: AtomicU64,
}

impl UidGenerator {
    /// Creates a generator in the given mode.
    #[must_use]
    pub fn new(mode: UidMode) -> Self {
        Self {
            mode,
            counter: AtomicU64::new(0),
        }
    }

    /// Shorthand for a time-ordered generator.
    #[must_use]
    pub fn time_ordered() -> Self {
        Self::new(UidMode::TimeOrdered)
    }

    /// Shorthand for a sequential generator.
    #[must_use]
    pub fn sequential() -> Self {
        Self::new(UidMode::Sequential)
    }

    /// Returns the generator's mode.
    #[must_use]
    pub fn mode(&self) -> UidMode {
        self.mode
    }

    /// Mints the next uid.
    pub fn next_uid(&self) -> Uid {
        match self.mode {
            UidMode::TimeOrdered => Uid::new(),
            UidMode::Sequential => {
                let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
                Uid(n.to_string())
            }
        }
    }
}

impl Default for UidGenerator {
    fn default() -> Self {
        Self::time_ordered()
    }
}
