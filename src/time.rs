//! Simulated time for the device kernel.
//!
//! Represents a non-negative logical timestamp with no dependency on
//! `std::time`. Time advances only when the event queue dispatches
//! events, never from wall-clock observation.

use std::cmp::Ordering;

use crate::error::{DevsimError, DevsimResult};

/// A point in simulated time.
///
/// Always finite and non-negative, which makes the ordering total: the
/// `Ord` impl is `f64::total_cmp` over values that can never be NaN.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct SimTime(f64);

impl SimTime {
    /// The zero-point of simulation time.
    pub const ZERO: SimTime = SimTime(0.0);

    /// Create a timestamp, rejecting negative or non-finite values.
    pub fn new(t: f64) -> DevsimResult<Self> {
        if !t.is_finite() {
            return Err(DevsimError::config("time", format!("{} is not finite", t)));
        }
        if t < 0.0 {
            return Err(DevsimError::config("time", format!("{} is negative", t)));
        }
        // Normalise -0.0 so that equal instants hash and compare identically.
        Ok(SimTime(t + 0.0))
    }

    /// Return the raw value.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// The absolute time `delay` units after `self`.
    pub fn plus(self, delay: f64) -> DevsimResult<SimTime> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(DevsimError::config(
                "delay",
                format!("{} is not a non-negative finite duration", delay),
            ));
        }
        SimTime::new(self.0 + delay)
    }

    /// Returns `true` if `self` is strictly before `other`.
    #[inline]
    pub fn is_before(self, other: SimTime) -> bool {
        self < other
    }

    /// The later of two timestamps.
    #[inline]
    pub fn latest(self, other: SimTime) -> SimTime {
        if other > self {
            other
        } else {
            self
        }
    }
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::ZERO
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for SimTime {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl TryFrom<f64> for SimTime {
    type Error = DevsimError;

    fn try_from(t: f64) -> DevsimResult<Self> {
        SimTime::new(t)
    }
}

impl From<SimTime> for f64 {
    fn from(t: SimTime) -> f64 {
        t.0
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T={:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert_eq!(SimTime::ZERO.as_f64(), 0.0);
        assert_eq!(SimTime::default(), SimTime::ZERO);
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert!(matches!(SimTime::new(-1.0), Err(DevsimError::Configuration { .. })));
        assert!(SimTime::new(f64::NAN).is_err());
        assert!(SimTime::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_negative_zero_is_zero() {
        assert_eq!(SimTime::new(-0.0).unwrap(), SimTime::ZERO);
    }

    #[test]
    fn test_ordering() {
        let t1 = SimTime::new(1.5).unwrap();
        let t2 = SimTime::new(20.0).unwrap();
        assert!(t1 < t2);
        assert!(t1.is_before(t2));
        assert!(!t2.is_before(t1));
        assert_eq!(t1.latest(t2), t2);
        assert_eq!(t2.latest(t1), t2);
    }

    #[test]
    fn test_plus() {
        let t = SimTime::new(10.0).unwrap();
        assert_eq!(t.plus(5.0).unwrap(), SimTime::new(15.0).unwrap());
        assert!(t.plus(-1.0).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::new(42.0).unwrap().to_string(), "T=42.000");
    }
}
