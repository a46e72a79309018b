// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// The category of a persistence failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// Reading or writing the backing medium failed.
    Io,
    /// The write would exceed the store's byte quota.
    QuotaExceeded,
    /// A value could not be encoded.
    Serialization,
    /// A stored record or document could not be decoded.
    Corrupt,
}

impl StoreErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Serialization => "serialization",
            Self::Corrupt => "corrupt",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by a [`KeyValueStore`](crate::KeyValueStore) or [`DurableTier`](crate::DurableTier).
///
/// # Example
///
/// ```
/// use ridecache_durable::{StoreError, StoreErrorKind};
///
/// let error = StoreError::caused_by(StoreErrorKind::QuotaExceeded, "needs 10 more bytes");
/// assert_eq!(error.kind(), StoreErrorKind::QuotaExceeded);
/// ```
#[ohno::error]
#[display("durable store failure ({kind})")]
pub struct StoreError {
    kind: StoreErrorKind,
}

impl StoreError {
    /// Returns the category of this failure.
    #[must_use]
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }
}

impl From<StoreError> for ridecache_tier::Error {
    fn from(error: StoreError) -> Self {
        if error.kind == StoreErrorKind::Corrupt {
            Self::corrupt(error)
        } else {
            Self::from_message(error)
        }
    }
}
