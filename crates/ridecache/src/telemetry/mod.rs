// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry: structured `tracing` events and, with the `metrics` feature,
//! OpenTelemetry counters, histograms, and gauges.

use tracing::Level;

pub(crate) mod attributes;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

pub use cache::CacheTelemetry;
pub use config::TelemetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    Set,
    Delete,
    Clear,
    Revalidate,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Set => "cache.set",
            Self::Delete => "cache.delete",
            Self::Clear => "cache.clear",
            Self::Revalidate => "cache.revalidate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Fresh,
    Stale,
    Expired,
    Miss,
    Promoted,
    Inserted,
    Deleted,
    Refreshed,
    RefreshFailed,
    Fallback,
    Ok,
    Error,
}

impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "cache.fresh",
            Self::Stale => "cache.stale",
            Self::Expired => "cache.expired",
            Self::Miss => "cache.miss",
            Self::Promoted => "cache.promoted",
            Self::Inserted => "cache.inserted",
            Self::Deleted => "cache.deleted",
            Self::Refreshed => "cache.refreshed",
            Self::RefreshFailed => "cache.refresh_failed",
            Self::Fallback => "cache.fallback",
            Self::Ok => "cache.ok",
            Self::Error => "cache.error",
        }
    }

    /// Errors are recovered inside the cache, so they never log above WARN.
    pub fn level(self) -> Level {
        match self {
            Self::Fresh | Self::Miss | Self::Ok | Self::RefreshFailed => Level::DEBUG,
            Self::Stale | Self::Expired | Self::Promoted | Self::Inserted | Self::Deleted | Self::Refreshed | Self::Fallback => {
                Level::INFO
            }
            Self::Error => Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_operation_as_str() {
        assert_eq!(CacheOperation::Get.as_str(), "cache.get");
        assert_eq!(CacheOperation::Set.as_str(), "cache.set");
        assert_eq!(CacheOperation::Delete.as_str(), "cache.delete");
        assert_eq!(CacheOperation::Clear.as_str(), "cache.clear");
        assert_eq!(CacheOperation::Revalidate.as_str(), "cache.revalidate");
    }

    #[test]
    fn cache_activity_as_str() {
        assert_eq!(CacheActivity::Fresh.as_str(), "cache.fresh");
        assert_eq!(CacheActivity::Stale.as_str(), "cache.stale");
        assert_eq!(CacheActivity::Expired.as_str(), "cache.expired");
        assert_eq!(CacheActivity::Miss.as_str(), "cache.miss");
        assert_eq!(CacheActivity::Promoted.as_str(), "cache.promoted");
        assert_eq!(CacheActivity::Inserted.as_str(), "cache.inserted");
        assert_eq!(CacheActivity::Deleted.as_str(), "cache.deleted");
        assert_eq!(CacheActivity::Refreshed.as_str(), "cache.refreshed");
        assert_eq!(CacheActivity::RefreshFailed.as_str(), "cache.refresh_failed");
        assert_eq!(CacheActivity::Fallback.as_str(), "cache.fallback");
        assert_eq!(CacheActivity::Ok.as_str(), "cache.ok");
        assert_eq!(CacheActivity::Error.as_str(), "cache.error");
    }

    #[test]
    fn cache_activity_levels() {
        assert_eq!(CacheActivity::Fresh.level(), Level::DEBUG);
        assert_eq!(CacheActivity::RefreshFailed.level(), Level::DEBUG);
        assert_eq!(CacheActivity::Stale.level(), Level::INFO);
        assert_eq!(CacheActivity::Promoted.level(), Level::INFO);
        assert_eq!(CacheActivity::Error.level(), Level::WARN);
    }
}
