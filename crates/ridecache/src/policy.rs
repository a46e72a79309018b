// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-category freshness policies.

use std::borrow::Cow;
use std::time::Duration;

use ridecache_tier::FreshnessWindow;
use serde::{Deserialize, Deserializer};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Freshness rules for one category of cached data.
///
/// A policy carries a key prefix that namespaces the category, a default `max_age`
/// after which entries turn stale, and a default `stale_while_revalidate` window
/// during which stale entries are still served.
///
/// Policies can be loaded from configuration; durations are whole seconds:
///
/// ```
/// use ridecache::FreshnessPolicy;
/// use std::time::Duration;
///
/// let policy: FreshnessPolicy = serde_json::from_str(
///     r#"{"key_prefix": "news:", "max_age": 30, "stale_while_revalidate": 600}"#,
/// )?;
/// assert_eq!(policy.max_age(), Duration::from_secs(30));
/// assert_eq!(policy.cache_key("front"), "news:front");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct FreshnessPolicy {
    key_prefix: Cow<'static, str>,
    #[serde(deserialize_with = "seconds")]
    max_age: Duration,
    #[serde(deserialize_with = "seconds")]
    stale_while_revalidate: Duration,
}

impl FreshnessPolicy {
    /// Profile data: fresh for 5 minutes, served stale for 30 more.
    pub const USER_PROFILE: Self = Self::preset("user_profile:", 5 * MINUTE, 30 * MINUTE);

    /// Ride search results and single rides: fresh for 2 minutes, served stale for an hour.
    pub const RIDE_LISTINGS: Self = Self::preset("rides:", 2 * MINUTE, HOUR);

    /// Rarely changing content: fresh for a day, served stale for a week.
    pub const STATIC_CONTENT: Self = Self::preset("static:", DAY, 7 * DAY);

    /// Generic endpoint responses: fresh for 5 minutes, served stale for 30 more.
    pub const API_RESPONSES: Self = Self::preset("api:", 5 * MINUTE, 30 * MINUTE);

    const fn preset(key_prefix: &'static str, max_age_secs: u64, stale_secs: u64) -> Self {
        Self {
            key_prefix: Cow::Borrowed(key_prefix),
            max_age: Duration::from_secs(max_age_secs),
            stale_while_revalidate: Duration::from_secs(stale_secs),
        }
    }

    /// Creates a custom policy.
    #[must_use]
    pub fn new(key_prefix: impl Into<Cow<'static, str>>, max_age: Duration, stale_while_revalidate: Duration) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            max_age,
            stale_while_revalidate,
        }
    }

    /// Returns the prefix prepended to every logical key of this category.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Returns the default age at which entries turn stale.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Returns the default window after `max_age` during which stale entries are served.
    #[must_use]
    pub fn stale_while_revalidate(&self) -> Duration {
        self.stale_while_revalidate
    }

    /// Builds the storage key for a logical key.
    #[must_use]
    pub fn cache_key(&self, logical_key: &str) -> String {
        format!("{}{logical_key}", self.key_prefix)
    }

    /// Returns the effective window, with any overrides replacing the defaults.
    #[must_use]
    pub fn window(&self, overrides: Overrides) -> FreshnessWindow {
        FreshnessWindow::new(self.max_age, self.stale_while_revalidate)
            .with_overrides(overrides.max_age, overrides.stale_while_revalidate)
    }
}

/// Per-call replacements for a policy's durations.
///
/// Unset fields fall back to whatever the policy (or, on reads, the stored entry) says.
///
/// ```
/// use ridecache::Overrides;
/// use std::time::Duration;
///
/// let overrides = Overrides::new().with_max_age(Duration::from_secs(180));
/// assert_eq!(overrides.max_age(), Some(Duration::from_secs(180)));
/// assert_eq!(overrides.stale_while_revalidate(), None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Overrides {
    #[serde(default, deserialize_with = "optional_seconds")]
    max_age: Option<Duration>,
    #[serde(default, deserialize_with = "optional_seconds")]
    stale_while_revalidate: Option<Duration>,
}

impl Overrides {
    /// Creates overrides that change nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_age: None,
            stale_while_revalidate: None,
        }
    }

    /// Creates overrides that replace both durations.
    #[must_use]
    pub const fn window(max_age: Duration, stale_while_revalidate: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            stale_while_revalidate: Some(stale_while_revalidate),
        }
    }

    /// Replaces `max_age`.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Replaces `stale_while_revalidate`.
    #[must_use]
    pub const fn with_stale_while_revalidate(mut self, stale_while_revalidate: Duration) -> Self {
        self.stale_while_revalidate = Some(stale_while_revalidate);
        self
    }

    /// Returns the `max_age` override, if any.
    #[must_use]
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Returns the `stale_while_revalidate` override, if any.
    #[must_use]
    pub fn stale_while_revalidate(&self) -> Option<Duration> {
        self.stale_while_revalidate
    }

    /// Returns true if neither duration is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_age.is_none() && self.stale_while_revalidate.is_none()
    }
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

fn optional_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_category_table() {
        let cases = [
            (FreshnessPolicy::USER_PROFILE, "user_profile:", 300, 1_800),
            (FreshnessPolicy::RIDE_LISTINGS, "rides:", 120, 3_600),
            (FreshnessPolicy::STATIC_CONTENT, "static:", 86_400, 604_800),
            (FreshnessPolicy::API_RESPONSES, "api:", 300, 1_800),
        ];

        for (policy, prefix, max_age, swr) in cases {
            assert_eq!(policy.key_prefix(), prefix);
            assert_eq!(policy.max_age(), Duration::from_secs(max_age));
            assert_eq!(policy.stale_while_revalidate(), Duration::from_secs(swr));
        }
    }

    #[test]
    fn cache_key_concatenates_prefix() {
        assert_eq!(FreshnessPolicy::RIDE_LISTINGS.cache_key("ride:42"), "rides:ride:42");
        assert_eq!(FreshnessPolicy::API_RESPONSES.cache_key(""), "api:");
    }

    #[test]
    fn overrides_take_precedence_field_by_field() {
        let window = FreshnessPolicy::USER_PROFILE.window(Overrides::new().with_max_age(Duration::from_secs(180)));
        assert_eq!(window.max_age(), Duration::from_secs(180));
        assert_eq!(window.stale_while_revalidate(), Duration::from_secs(1_800));

        let window = FreshnessPolicy::USER_PROFILE.window(Overrides::new());
        assert_eq!(window.max_age(), Duration::from_secs(300));
    }

    #[test]
    fn overrides_deserialize_with_missing_fields() {
        let overrides: Overrides = serde_json::from_str(r#"{"stale_while_revalidate": 60}"#).unwrap();
        assert_eq!(overrides, Overrides::new().with_stale_while_revalidate(Duration::from_secs(60)));
        assert!(!overrides.is_empty());

        let empty: Overrides = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
