//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for configuration values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("admin URI cannot be empty or whitespace")]
    EmptyAdminUri,

    #[error("admin URI must start with http:// or https://: {0}")]
    InvalidAdminUri(String),

    #[error("config path cannot be empty or whitespace")]
    EmptyConfigPath,

    #[error("buffer size must be at least 3, got {0}")]
    BufferTooSmall(usize),
}

/// Macro to generate validated string newtypes.
///
/// Each type gets a validating `new()`, `as_str()`, `AsRef<str>`, `Deref`,
/// `Display`, `TryFrom<String>`, `FromStr` (for clap) and serde support that
/// re-runs validation on deserialization.
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// Base URI of the proxy's admin listener, e.g. `http://localhost:9901`
    ///
    /// Only the scheme is checked here; reqwest reports anything else when the
    /// first request is built.
    pub struct AdminUri(String) {
        validation: |s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(ValidationError::EmptyAdminUri)
            } else if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                Err(ValidationError::InvalidAdminUri(s.clone()))
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// Path to the TOML configuration file
    pub struct ConfigPath(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyConfigPath)
            } else {
                Ok(())
            }
        },
    }
}

impl AdminUri {
    /// Local admin listener used when nothing else is configured
    pub const DEFAULT: &'static str = "http://localhost:9901";

    /// Join an endpoint path onto this base URI without doubling slashes
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.0.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for AdminUri {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_uri_valid() {
        let uri = AdminUri::new("http://localhost:9000".to_string()).unwrap();
        assert_eq!(uri.as_str(), "http://localhost:9000");

        let tls = AdminUri::new("https://envoy.internal:9901".to_string()).unwrap();
        assert_eq!(tls.to_string(), "https://envoy.internal:9901");
    }

    #[test]
    fn test_admin_uri_rejects_empty() {
        assert_eq!(
            AdminUri::new("   ".to_string()),
            Err(ValidationError::EmptyAdminUri)
        );
    }

    #[test]
    fn test_admin_uri_rejects_missing_scheme() {
        assert!(matches!(
            AdminUri::new("localhost:9901".to_string()),
            Err(ValidationError::InvalidAdminUri(_))
        ));
    }

    #[test]
    fn test_admin_uri_join() {
        let uri = AdminUri::new("http://localhost:9000/".to_string()).unwrap();
        assert_eq!(uri.join("/stats"), "http://localhost:9000/stats");
        assert_eq!(uri.join("clusters"), "http://localhost:9000/clusters");
    }

    #[test]
    fn test_admin_uri_default() {
        assert_eq!(AdminUri::default().as_str(), "http://localhost:9901");
    }

    #[test]
    fn test_config_path() {
        let path: ConfigPath = "envoy-dash.toml".parse().unwrap();
        assert_eq!(&*path, "envoy-dash.toml");
        assert_eq!(
            ConfigPath::new(String::new()),
            Err(ValidationError::EmptyConfigPath)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        #[derive(Deserialize)]
        struct Section {
            address: AdminUri,
        }

        assert!(toml::from_str::<Section>("address = \"http://a:1\"").is_ok());
        assert!(toml::from_str::<Section>("address = \"ftp://a:1\"").is_err());
    }
}
