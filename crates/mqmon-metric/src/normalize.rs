//! Raw-value normalization.
//!
//! Published counters arrive in whatever unit the queue manager chose to
//! encode them in: hundredths of a percent, hundredths of a second,
//! megabytes. Each metric definition carries a [`Normalization`] rule; the
//! aggregation core applies it blindly and reports the result.

use crate::status::StatusAttribute;
use crate::store::MetricElement;

/// How a raw i64 sample becomes a reportable f64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Report the value as-is.
    Raw,
    /// Value published as hundredths of a percent.
    Percent,
    /// Value published in hundredths of a second; reported in seconds.
    HundredthsOfSecond,
    /// Value published in megabytes; reported in bytes.
    MegaBytes,
    /// Value published in microseconds; reported in seconds.
    Microseconds,
}

impl Normalization {
    pub fn apply(self, value: i64) -> f64 {
        let v = value as f64;
        match self {
            Normalization::Raw => v,
            Normalization::Percent => v / 100.0,
            Normalization::HundredthsOfSecond => v / 100.0,
            Normalization::MegaBytes => v * 1_048_576.0,
            Normalization::Microseconds => v / 1_000_000.0,
        }
    }
}

/// Normalize a published-metric sample. The object key is part of the
/// contract so rules can one day differ per key; today none do.
pub fn normalize(elem: &MetricElement, _key: &str, value: i64) -> f64 {
    elem.normalization().apply(value)
}

/// Normalize a polled channel-status sample.
pub fn channel_normalize(attr: &StatusAttribute, value: i64) -> f64 {
    attr.normalization().apply(value)
}

/// Normalize a polled queue-status sample.
pub fn queue_normalize(attr: &StatusAttribute, value: i64) -> f64 {
    attr.normalization().apply(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules() {
        assert_eq!(Normalization::Raw.apply(5), 5.0);
        assert_eq!(Normalization::Percent.apply(2500), 25.0);
        assert_eq!(Normalization::HundredthsOfSecond.apply(150), 1.5);
        assert_eq!(Normalization::MegaBytes.apply(2), 2_097_152.0);
        assert_eq!(Normalization::Microseconds.apply(1_500_000), 1.5);
    }

    #[test]
    fn test_negative_values_pass_through() {
        assert_eq!(Normalization::Raw.apply(-1), -1.0);
        assert_eq!(Normalization::Percent.apply(-100), -1.0);
    }

    #[test]
    fn test_element_and_attribute_normalization() {
        let elem = MetricElement::new("queue_depth", "", Normalization::Raw);
        assert_eq!(normalize(&elem, "APP.REQUEST", 5), 5.0);

        let attr = StatusAttribute::new("channel_time_short", Normalization::HundredthsOfSecond);
        assert_eq!(channel_normalize(&attr, 250), 2.5);
        let attr = StatusAttribute::new("queue_uncommitted_messages", Normalization::Raw);
        assert_eq!(queue_normalize(&attr, 9), 9.0);
    }
}
