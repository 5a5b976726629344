//! Transient (key, value) observations produced by one poll

use std::fmt;

/// Value observed for a key in one poll response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleValue {
    /// Integer counter or gauge, buffered with history
    Numeric(i64),
    /// Informational text (version strings, health flags), overwritten in place
    Scalar(String),
}

impl SampleValue {
    /// Classify a raw field
    ///
    /// Integers become numeric. A plain decimal such as `success_rate`'s
    /// `98.5` or `-1.0` is truncated toward zero so the stat keeps one kind
    /// across polls. Anything else (addresses, zones, flags) is scalar text.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>().ok().or_else(|| truncate_decimal(trimmed)) {
            Some(value) => Self::Numeric(value),
            None => Self::Scalar(raw.to_string()),
        }
    }
}

fn truncate_decimal(text: &str) -> Option<i64> {
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+'))
    {
        return None;
    }
    let value = text.parse::<f64>().ok()?;
    (value.is_finite() && value.abs() < i64::MAX as f64).then(|| value.trunc() as i64)
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{}", value),
            Self::Scalar(text) => f.write_str(text),
        }
    }
}

/// One parsed observation; lives only until it is written into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample<K> {
    pub key: K,
    pub value: SampleValue,
}

impl<K> MetricSample<K> {
    /// Numeric observation
    #[must_use]
    pub fn numeric(key: K, value: i64) -> Self {
        Self {
            key,
            value: SampleValue::Numeric(value),
        }
    }

    /// Scalar observation
    #[must_use]
    pub fn scalar(key: K, text: impl Into<String>) -> Self {
        Self {
            key,
            value: SampleValue::Scalar(text.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_numeric() {
        assert_eq!(SampleValue::classify("17"), SampleValue::Numeric(17));
        assert_eq!(SampleValue::classify(" -4 "), SampleValue::Numeric(-4));
    }

    #[test]
    fn test_classify_scalar_keeps_literal() {
        assert_eq!(
            SampleValue::classify("healthy"),
            SampleValue::Scalar("healthy".to_string())
        );
        assert_eq!(
            SampleValue::classify("10.0.0.1"),
            SampleValue::Scalar("10.0.0.1".to_string())
        );
        assert_eq!(
            SampleValue::classify("1e5"),
            SampleValue::Scalar("1e5".to_string())
        );
    }

    #[test]
    fn test_classify_decimal_truncates() {
        assert_eq!(SampleValue::classify("98.7"), SampleValue::Numeric(98));
        assert_eq!(SampleValue::classify("-1.0"), SampleValue::Numeric(-1));
        assert_eq!(SampleValue::classify("-0.5"), SampleValue::Numeric(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(SampleValue::Numeric(42).to_string(), "42");
        assert_eq!(SampleValue::Scalar("1.27.0".into()).to_string(), "1.27.0");
    }
}
