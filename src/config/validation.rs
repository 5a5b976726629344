//! Configuration validation
//!
//! Value ranges (non-zero durations, minimum buffer size, URI scheme) are
//! enforced by the newtypes at construction. This checks what the types
//! cannot see on their own.

use anyhow::Result;

use super::types::Config;

impl Config {
    /// Validate cross-field constraints
    ///
    /// - an explicit request timeout is strictly shorter than the polling
    ///   interval
    /// - endpoint paths are non-empty
    pub fn validate(&self) -> Result<()> {
        let interval = self.polling.interval_ms;
        if let Some(timeout) = self.polling.timeout_ms
            && timeout.get() >= interval.get()
        {
            return Err(anyhow::anyhow!(
                "Request timeout ({}) must be shorter than the polling interval ({})",
                timeout,
                interval
            ));
        }

        if self.admin.stats_uri.is_none() && self.admin.stats_path.trim().is_empty() {
            return Err(anyhow::anyhow!("admin.stats_path cannot be empty"));
        }
        if self.admin.clusters_uri.is_none() && self.admin.clusters_path.trim().is_empty() {
            return Err(anyhow::anyhow!("admin.clusters_path cannot be empty"));
        }

        if self.history.buffer_size.get() > 3600 {
            tracing::warn!(
                "History buffer of {} samples is large; every series allocates it in full",
                self.history.buffer_size
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PollingInterval, RequestTimeout};

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_timeout_must_be_shorter_than_interval() {
        let mut config = Config::default();
        config.polling.interval_ms = PollingInterval::new(500).unwrap();
        config.polling.timeout_ms = RequestTimeout::new(500);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must be shorter"));
    }

    #[test]
    fn test_short_interval_without_timeout_is_valid() {
        let mut config = Config::default();
        config.polling.interval_ms = PollingInterval::new(300).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.polling.request_timeout().get() < 300);
    }

    #[test]
    fn test_empty_path_rejected() {
        let mut config = Config::default();
        config.admin.clusters_path = " ".to_string();
        assert!(config.validate().is_err());
    }
}
