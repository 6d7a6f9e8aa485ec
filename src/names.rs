//! Closed, per-device-type name sets for states, inputs and actions.
//!
//! Each device type declares its states, inputs and actions as plain enums
//! implementing [`NameSet`]. The kernel moves them around by index and only
//! turns them back into names at the trace boundary.

/// A closed enumeration with a stable name and index per variant.
pub trait NameSet: Copy + Eq + std::fmt::Debug + 'static {
    /// Every variant, in declaration order. `ALL[v.index()] == v`.
    const ALL: &'static [Self];

    /// The variant's diagnostic name.
    fn name(self) -> &'static str;

    /// Position of the variant in [`NameSet::ALL`].
    fn index(self) -> usize;

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.name()).collect()
    }
}

/// Declare a fieldless enum together with its [`NameSet`] impl.
///
/// ```rust
/// devsim::name_set! {
///     /// Door states.
///     pub enum DoorState {
///         Closed => "closed",
///         Open => "open",
///     }
/// }
///
/// use devsim::NameSet;
/// assert_eq!(DoorState::Open.name(), "open");
/// assert_eq!(DoorState::from_name("closed"), Some(DoorState::Closed));
/// ```
#[macro_export]
macro_rules! name_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $ty:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $name:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $ty {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::names::NameSet for $ty {
            const ALL: &'static [Self] = &[$( $ty::$variant ),+];

            fn name(self) -> &'static str {
                match self {
                    $( $ty::$variant => $name ),+
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::names::NameSet::name(*self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::NameSet;

    crate::name_set! {
        enum Light {
            Red => "red",
            Amber => "amber",
            Green => "green",
        }
    }

    #[test]
    fn test_index_round_trips_through_all() {
        for (i, v) in Light::ALL.iter().enumerate() {
            assert_eq!(v.index(), i);
            assert_eq!(Light::from_index(i), Some(*v));
        }
        assert_eq!(Light::from_index(3), None);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Light::from_name("amber"), Some(Light::Amber));
        assert_eq!(Light::from_name("blue"), None);
        assert_eq!(Light::names(), vec!["red", "amber", "green"]);
        assert_eq!(Light::Green.to_string(), "green");
    }
}
