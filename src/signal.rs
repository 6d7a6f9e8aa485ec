//! Scalar signal values carried by outputs and event payloads.

/// The concrete value inside a defined signal.
///
/// Devices treat scalars as opaque; integers are what address and data
/// lines carry, text exists for symbolic memory content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(untagged))]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// A signal level: a defined scalar or one of the two sentinels.
///
/// Equality distinguishes all three forms, so `Undefined`, `Zero` and
/// `Defined(Int(0))` are pairwise different.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    Defined(Scalar),
    /// Value not (yet) known, e.g. a memory output while a read settles.
    #[default]
    Undefined,
    /// The canonical inactive level.
    Zero,
}

impl Signal {
    /// A defined integer signal.
    pub fn int(n: i64) -> Self {
        Signal::Defined(Scalar::Int(n))
    }

    /// A defined text signal.
    pub fn text(s: impl Into<String>) -> Self {
        Signal::Defined(Scalar::Text(s.into()))
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Signal::Defined(_))
    }

    /// The integer reading of this signal, if it has one.
    ///
    /// `Zero` reads as `0`; `Undefined` and text have no integer reading.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Signal::Defined(Scalar::Int(n)) => Some(*n),
            Signal::Zero => Some(0),
            _ => None,
        }
    }

    /// The text content, if this is a defined text signal.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Signal::Defined(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Signal {
    fn from(n: i64) -> Self {
        Signal::int(n)
    }
}

impl From<i32> for Signal {
    fn from(n: i32) -> Self {
        Signal::int(i64::from(n))
    }
}

impl From<&str> for Signal {
    fn from(s: &str) -> Self {
        Signal::text(s)
    }
}

impl From<String> for Signal {
    fn from(s: String) -> Self {
        Signal::text(s)
    }
}

impl From<Scalar> for Signal {
    fn from(s: Scalar) -> Self {
        Signal::Defined(s)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Defined(s) => write!(f, "{}", s),
            Signal::Undefined => write!(f, "<undef>"),
            Signal::Zero => write!(f, "<zero>"),
        }
    }
}
