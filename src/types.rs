//! Core domain types shared by the store, the pollers and the views
//!
//! This module provides metric keys and the validated configuration values
//! used throughout the dashboard.

pub mod config;
pub mod key;
pub mod sample;
pub mod validated;

pub use config::{BufferSize, PollingInterval, RequestTimeout};
pub use key::{ClusterKey, FlatKey, MetricKey};
pub use sample::{MetricSample, SampleValue};
pub use validated::{AdminUri, ConfigPath, ValidationError};
