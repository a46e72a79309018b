// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache tier operations.

/// An error from a cache tier operation.
///
/// This is an opaque error type that can wrap any underlying error from a tier
/// implementation, such as an I/O failure in a durable tier or a corrupt record.
/// Use [`std::error::Error::source()`] to access the underlying cause.
///
/// # Example
///
/// ```
/// use ridecache_tier::Error;
///
/// let error = Error::from_message("quota exceeded");
/// ```
#[ohno::error]
pub struct Error {
    corrupt: bool,
}

impl Error {
    /// Creates a new error from any type that can be converted to an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use ridecache_tier::Error;
    ///
    /// let io = std::io::Error::other("disk full");
    /// let error = Error::from_message(io);
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(false, cause)
    }

    /// Creates an error for a stored record that can never be decoded.
    ///
    /// Unlike other failures, retrying the read will not help, so callers may
    /// remove the record.
    ///
    /// ```
    /// use ridecache_tier::Error;
    ///
    /// assert!(Error::corrupt("expected value at line 1").is_corrupt());
    /// assert!(!Error::from_message("disk busy").is_corrupt());
    /// ```
    pub fn corrupt(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(true, cause)
    }

    /// Returns true if the failed record is undecodable rather than unreachable.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        self.corrupt
    }
}

/// A specialized [`Result`] type for cache tier operations.
pub type Result<T> = std::result::Result<T, Error>;
