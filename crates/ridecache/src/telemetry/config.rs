// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry configuration for cache operations.

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};

use crate::telemetry::CacheTelemetry;

/// Configuration for cache telemetry.
///
/// Everything is disabled by default. Enable logs and/or metrics, then pass the
/// built [`CacheTelemetry`] to the store builder.
///
/// # Examples
///
/// ```
/// use ridecache::{CacheStore, TelemetryConfig};
/// use tick::Clock;
///
/// let telemetry = TelemetryConfig::new().with_logs().build();
/// let store = CacheStore::builder::<String>(Clock::new_frozen())
///     .telemetry(telemetry)
///     .name("carpool")
///     .build();
/// assert_eq!(store.name(), "carpool");
/// ```
#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl TelemetryConfig {
    /// Creates a new telemetry configuration with everything disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a structured `tracing` event for every cache operation.
    #[must_use]
    pub fn with_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    /// Records counters, durations, and the in-process size through OpenTelemetry.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the telemetry collector from this configuration.
    #[must_use]
    pub fn build(self) -> CacheTelemetry {
        #[cfg(any(feature = "metrics", test))]
        if let Some(meter) = &self.meter {
            return CacheTelemetry::with_meter(self.logs_enabled, Some(meter));
        }

        CacheTelemetry::logs_only(self.logs_enabled)
    }
}
