//! Configuration-related type-safe wrappers using NonZero types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use super::ValidationError;

/// Number of slots in every circular buffer (and in the shared timestamp table)
///
/// The delta series needs two seeded slots before it can emit anything, so
/// capacities below [`BufferSize::MIN`] are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferSize(NonZeroUsize);

impl BufferSize {
    /// Smallest capacity that can still produce a delta point
    pub const MIN: usize = 3;

    /// Default history: 20 samples
    pub const DEFAULT: Self = Self(NonZeroUsize::new(20).unwrap());

    /// Create a new BufferSize, returning an error below [`Self::MIN`]
    pub const fn new(value: usize) -> Result<Self, ValidationError> {
        if value < Self::MIN {
            return Err(ValidationError::BufferTooSmall(value));
        }
        match NonZeroUsize::new(value) {
            Some(nz) => Ok(Self(nz)),
            None => Err(ValidationError::BufferTooSmall(value)),
        }
    }

    /// Get the value as usize
    #[must_use]
    #[inline]
    pub const fn get(&self) -> usize {
        self.0.get()
    }
}

impl Default for BufferSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BufferSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl TryFrom<usize> for BufferSize {
    type Error = ValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::str::FromStr for BufferSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .parse()
            .map_err(|e| format!("Invalid buffer size: {}", e))?;
        Self::new(value).map_err(|e| e.to_string())
    }
}

impl Serialize for BufferSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.get() as u64)
    }
}

impl<'de> Deserialize<'de> for BufferSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = usize::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

/// Macro to generate non-zero millisecond duration newtypes.
///
/// Each type gets a `new()` constructor returning `None` for zero, `get()`
/// returning milliseconds, `as_duration()`, a `DEFAULT` constant, and
/// serde support as a plain integer of milliseconds.
macro_rules! millis_newtype {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            default: $default:literal,
            what: $what:literal,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(NonZeroU64);

        impl $name {
            #[doc = concat!("Default ", $what, ": ", stringify!($default), "ms")]
            pub const DEFAULT: Self = Self(NonZeroU64::new($default).unwrap());

            #[doc = concat!("Create a new ", stringify!($name), ", returning None if millis is 0")]
            #[must_use]
            pub const fn new(millis: u64) -> Option<Self> {
                match NonZeroU64::new(millis) {
                    Some(nz) => Some(Self(nz)),
                    None => None,
                }
            }

            /// Get the value in milliseconds
            #[must_use]
            #[inline]
            pub const fn get(&self) -> u64 {
                self.0.get()
            }

            /// Get the value as a Duration
            #[must_use]
            #[inline]
            pub const fn as_duration(&self) -> Duration {
                Duration::from_millis(self.0.get())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::DEFAULT
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}ms", self.get())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let millis: u64 = s
                    .parse()
                    .map_err(|e| format!(concat!("Invalid ", $what, ": {}"), e))?;
                Self::new(millis).ok_or_else(|| concat!($what, " cannot be 0").to_string())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_u64(self.get())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let millis = u64::deserialize(deserializer)?;
                Self::new(millis)
                    .ok_or_else(|| serde::de::Error::custom(concat!($what, " cannot be 0")))
            }
        }
    };
}

millis_newtype! {
    /// Time between two poll cycles
    pub struct PollingInterval {
        default: 1000,
        what: "polling interval",
    }
}

millis_newtype! {
    /// Upper bound on a single admin request, including reading the body
    ///
    /// Must stay below the polling interval so a hung connection degrades to a
    /// missing sample instead of stalling the cadence.
    pub struct RequestTimeout {
        default: 800,
        what: "request timeout",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_default() {
        assert_eq!(BufferSize::DEFAULT.get(), 20);
        assert_eq!(BufferSize::default(), BufferSize::DEFAULT);
    }

    #[test]
    fn test_buffer_size_minimum() {
        assert!(BufferSize::new(3).is_ok());
        assert_eq!(
            BufferSize::new(2),
            Err(ValidationError::BufferTooSmall(2))
        );
        assert_eq!(
            BufferSize::new(0),
            Err(ValidationError::BufferTooSmall(0))
        );
    }

    #[test]
    fn test_buffer_size_from_str() {
        let size: BufferSize = "60".parse().unwrap();
        assert_eq!(size.get(), 60);
        assert!("abc".parse::<BufferSize>().is_err());
        assert!("1".parse::<BufferSize>().is_err());
    }

    #[test]
    fn test_polling_interval() {
        assert_eq!(PollingInterval::DEFAULT.get(), 1000);
        assert_eq!(
            PollingInterval::new(250).unwrap().as_duration(),
            Duration::from_millis(250)
        );
        assert!(PollingInterval::new(0).is_none());
        assert_eq!(PollingInterval::DEFAULT.to_string(), "1000ms");
    }

    #[test]
    fn test_request_timeout_parse() {
        let timeout: RequestTimeout = "500".parse().unwrap();
        assert_eq!(timeout.get(), 500);
        let err = "0".parse::<RequestTimeout>().unwrap_err();
        assert_eq!(err, "request timeout cannot be 0");
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        #[derive(Deserialize)]
        struct Section {
            buffer_size: BufferSize,
            interval_ms: PollingInterval,
        }

        let ok: Section = toml::from_str("buffer_size = 5\ninterval_ms = 200").unwrap();
        assert_eq!(ok.buffer_size.get(), 5);
        assert_eq!(ok.interval_ms.get(), 200);

        assert!(toml::from_str::<Section>("buffer_size = 1\ninterval_ms = 200").is_err());
        assert!(toml::from_str::<Section>("buffer_size = 5\ninterval_ms = 0").is_err());
    }
}
