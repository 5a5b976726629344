//! Default values for configuration fields
//!
//! Used as serde `default = "..."` functions so partially filled sections
//! still deserialize.

use crate::types::{AdminUri, BufferSize, PollingInterval, RequestTimeout};

/// Default admin listener base URI
#[inline]
pub fn admin_address() -> AdminUri {
    AdminUri::default()
}

/// Default flat stats endpoint path
#[inline]
pub fn stats_path() -> String {
    "/stats".to_string()
}

/// Default clusters endpoint path
#[inline]
pub fn clusters_path() -> String {
    "/clusters".to_string()
}

/// Default time between polls (1s)
#[inline]
pub fn polling_interval() -> PollingInterval {
    PollingInterval::DEFAULT
}

/// Default per-request timeout (800ms)
#[inline]
pub fn request_timeout() -> RequestTimeout {
    RequestTimeout::DEFAULT
}

/// Default history length (20 samples)
#[inline]
pub fn buffer_size() -> BufferSize {
    BufferSize::DEFAULT
}
