//! Derived campaign metrics in two-decimal fixed point.
//!
//! Ratios are computed in integer hundredths with round-half-up, so the
//! same counts always render the same digits. A zero denominator yields
//! [`Metric::NoData`] instead of a NaN or infinity.

use std::fmt;

use serde::{Serialize, Serializer};

/// A non-negative value with exactly two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hundredths(pub u64);

impl Hundredths {
    pub fn from_whole(value: u64) -> Self {
        Hundredths(value.saturating_mul(100))
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Hundredths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// A derived metric, or the absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Value(Hundredths),
    /// The denominator was zero.
    NoData,
}

impl Metric {
    pub fn value(&self) -> Option<Hundredths> {
        match self {
            Metric::Value(v) => Some(*v),
            Metric::NoData => None,
        }
    }

    /// Strictly greater than `threshold`. `NoData` never exceeds anything.
    pub fn exceeds(&self, threshold: Hundredths) -> bool {
        self.value().is_some_and(|v| v > threshold)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => v.fmt(f),
            Metric::NoData => f.write_str("—"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(v) => serializer.serialize_f64(v.as_f64()),
            Metric::NoData => serializer.serialize_none(),
        }
    }
}

/// `numerator / denominator * scale`, in hundredths, rounded half up.
fn scaled_ratio(numerator: u64, denominator: u64, scale: u64) -> Metric {
    if denominator == 0 {
        return Metric::NoData;
    }
    let numerator = numerator as u128 * scale as u128 * 100;
    let denominator = denominator as u128;
    let rounded = (numerator * 2 + denominator) / (denominator * 2);
    Metric::Value(Hundredths(u64::try_from(rounded).unwrap_or(u64::MAX)))
}

/// Clicks per impression, as a percentage.
pub fn click_through_rate(clicks: u64, impressions: u64) -> Metric {
    scaled_ratio(clicks, impressions, 100)
}

/// Spend per click, in currency units.
pub fn cost_per_click(spent: u64, clicks: u64) -> Metric {
    scaled_ratio(spent, clicks, 1)
}

/// Conversions per click, as a percentage.
pub fn conversion_rate(conversions: u64, clicks: u64) -> Metric {
    scaled_ratio(conversions, clicks, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctr_rounds_half_up() {
        // 1 / 8 * 100 = 12.5 exactly
        assert_eq!(click_through_rate(1, 8).to_string(), "12.50");
        // 1 / 3 * 100 = 33.333...
        assert_eq!(click_through_rate(1, 3).to_string(), "33.33");
        // 2 / 3 * 100 = 66.666...
        assert_eq!(click_through_rate(2, 3).to_string(), "66.67");
        // 1 / 1600 * 100 = 0.0625 -> 0.06
        assert_eq!(click_through_rate(1, 1600).to_string(), "0.06");
        // 1 / 800 * 100 = 0.125 -> 0.13
        assert_eq!(click_through_rate(1, 800).to_string(), "0.13");
    }

    #[test]
    fn test_cpc() {
        assert_eq!(cost_per_click(100, 3).to_string(), "33.33");
        assert_eq!(cost_per_click(5, 2).to_string(), "2.50");
        assert_eq!(cost_per_click(0, 7).to_string(), "0.00");
    }

    #[test]
    fn test_zero_denominator_is_no_data() {
        assert_eq!(click_through_rate(10, 0), Metric::NoData);
        assert_eq!(cost_per_click(250, 0), Metric::NoData);
        assert_eq!(conversion_rate(0, 0), Metric::NoData);
        assert_eq!(Metric::NoData.to_string(), "—");
    }

    #[test]
    fn test_exceeds() {
        let two = Hundredths::from_whole(2);
        assert!(click_through_rate(3, 100).exceeds(two));
        assert!(!click_through_rate(2, 100).exceeds(two));
        assert!(!Metric::NoData.exceeds(Hundredths(0)));
    }

    #[test]
    fn test_large_counts_do_not_overflow() {
        let m = cost_per_click(u64::MAX, 1);
        assert_eq!(m.value(), Some(Hundredths(u64::MAX)));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(
            serde_json::to_value(click_through_rate(1, 8)).unwrap(),
            serde_json::json!(12.5)
        );
        assert_eq!(
            serde_json::to_value(Metric::NoData).unwrap(),
            serde_json::Value::Null
        );
    }
}
