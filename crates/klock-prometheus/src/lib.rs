//! Prometheus metrics backend for klock.
//!
//! [`PrometheusMetrics`] implements [`klock_core::MetricsBackend`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use klock_core::KeyedLock;
//! use klock_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let lock = KeyedLock::default().with_metrics(Arc::new(metrics.clone()));
//!
//! let families = metrics.gather();
//! let mut buffer = Vec::new();
//! TextEncoder::new().encode(&families, &mut buffer)?;
//! # drop(lock);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `klock_entries_submitted_total` - Counter
//! - `klock_entries_settled_total{outcome}` - Counter
//! - `klock_wait_seconds` - Histogram
//! - `klock_run_seconds{outcome}` - Histogram
//!
//! This crate does not serve `/metrics`; plug [`PrometheusMetrics::gather`] into an existing HTTP server.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
