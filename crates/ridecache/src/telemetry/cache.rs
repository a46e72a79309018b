// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry recording.

use std::sync::Arc;
use std::time::Duration;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Gauge, Histogram, Meter},
};
use tracing::Level;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::{
    attributes,
    metrics::{create_cache_size_gauge, create_event_counter, create_operation_duration_histogram},
};
use crate::{
    store::CacheName,
    telemetry::{CacheActivity, CacheOperation},
};

/// Records cache operations as structured logs and metrics.
///
/// Build one with [`TelemetryConfig`](crate::TelemetryConfig) and hand it to
/// [`CacheStoreBuilder::telemetry`](crate::CacheStoreBuilder::telemetry). Clones share
/// the same instruments.
#[derive(Clone, Debug)]
pub struct CacheTelemetry {
    inner: Arc<CacheTelemetryInner>,
}

#[derive(Debug)]
struct CacheTelemetryInner {
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<Counter<u64>>,
    #[cfg(any(feature = "metrics", test))]
    operation_duration: Option<Histogram<f64>>,
    #[cfg(any(feature = "metrics", test))]
    cache_size: Option<Gauge<u64>>,
}

impl CacheTelemetry {
    pub(crate) fn logs_only(logging_enabled: bool) -> Self {
        Self {
            inner: Arc::new(CacheTelemetryInner {
                logging_enabled,
                #[cfg(any(feature = "metrics", test))]
                event_counter: None,
                #[cfg(any(feature = "metrics", test))]
                operation_duration: None,
                #[cfg(any(feature = "metrics", test))]
                cache_size: None,
            }),
        }
    }

    #[cfg(any(feature = "metrics", test))]
    pub(crate) fn with_meter(logging_enabled: bool, meter: Option<&Meter>) -> Self {
        Self {
            inner: Arc::new(CacheTelemetryInner {
                logging_enabled,
                event_counter: meter.map(create_event_counter),
                operation_duration: meter.map(create_operation_duration_histogram),
                cache_size: meter.map(create_cache_size_gauge),
            }),
        }
    }

    /// Records a cache operation.
    ///
    /// The key only goes to logs; metric attributes stay low-cardinality.
    pub(crate) fn record(
        &self,
        cache_name: CacheName,
        operation: CacheOperation,
        activity: CacheActivity,
        key: Option<&str>,
        duration: Option<Duration>,
    ) {
        #[cfg(any(feature = "metrics", test))]
        {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, cache_name),
                KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
            ];

            if let Some(c) = &self.inner.event_counter {
                c.add(1, &attrs);
            }

            if let (Some(d), Some(h)) = (duration, &self.inner.operation_duration) {
                h.record(d.as_secs_f64(), &attrs);
            }
        }

        if self.inner.logging_enabled {
            Self::emit(cache_name, operation, activity, key, duration);
        }
    }

    /// Records the number of entries held in process.
    #[cfg_attr(
        not(any(feature = "metrics", test)),
        expect(unused_variables, reason = "gauge only exists with metrics enabled")
    )]
    pub(crate) fn record_size(&self, cache_name: CacheName, size: u64) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(g) = &self.inner.cache_size {
            g.record(size, &[KeyValue::new(attributes::CACHE_NAME, cache_name)]);
        }
    }

    fn emit(cache_name: CacheName, operation: CacheOperation, activity: CacheActivity, key: Option<&str>, duration: Option<Duration>) {
        let op = operation.as_str();
        let act = activity.as_str();
        let duration_ns = duration.map(|d| d.as_nanos());

        // Levels must be constant in `tracing` macros, hence one arm per level.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = cache_name,
                    cache.operation = op,
                    cache.activity = act,
                    cache.key = key,
                    cache.duration_ns = ?duration_ns,
                    "cache.event"
                )
            };
        }

        match activity.level() {
            Level::WARN => emit_event!(warn),
            Level::INFO => emit_event!(info),
            _ => emit_event!(debug),
        }
    }
}
