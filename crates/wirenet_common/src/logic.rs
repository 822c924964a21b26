//! Four-valued wire logic with the multi-driver combine rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single bit as seen on a wire.
///
/// The four states represent:
/// - `Zero`: driven low
/// - `One`: driven high
/// - `Unknown`: not driven by anything (floating)
/// - `Error`: driven to conflicting values
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Floating or undriven.
    Unknown = 2,
    /// Conflicting drivers.
    Error = 3,
}

impl Logic {
    /// Converts a character to a [`Logic`] value.
    ///
    /// Accepts '0', '1', 'x'/'X' and 'u'/'U' for unknown, and 'e'/'E' for error.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' | 'u' | 'U' => Some(Logic::Unknown),
            'e' | 'E' => Some(Logic::Error),
            _ => None,
        }
    }

    /// Converts a boolean into a driven bit.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Logic::One
        } else {
            Logic::Zero
        }
    }

    /// Returns `true` for `Zero` and `One`.
    pub fn is_defined(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Combines two values driven onto the same bit.
    ///
    /// Combine truth table:
    /// ```text
    ///     0  1  x  E
    /// 0 | 0  E  0  E
    /// 1 | E  1  1  E
    /// x | 0  1  x  E
    /// E | E  E  E  E
    /// ```
    ///
    /// The operation is commutative and associative with `Unknown` as the
    /// identity and `Error` absorbing, so any number of drivers resolve to
    /// the same bit regardless of the order they are visited in.
    pub fn combine(self, other: Self) -> Self {
        use Logic::*;
        match (self, other) {
            (Error, _) | (_, Error) => Error,
            (Unknown, v) | (v, Unknown) => v,
            (a, b) if a == b => a,
            _ => Error,
        }
    }

    pub(crate) fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0 => Logic::Zero,
            1 => Logic::One,
            2 => Logic::Unknown,
            _ => Logic::Error,
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::Unknown => write!(f, "x"),
            Logic::Error => write!(f, "E"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Logic::{self, *};
    use proptest::prelude::*;

    fn any_logic() -> impl Strategy<Value = Logic> {
        prop_oneof![Just(Zero), Just(One), Just(Unknown), Just(Error)]
    }

    #[test]
    fn combine_truth_table() {
        // Agreement
        assert_eq!(Zero.combine(Zero), Zero);
        assert_eq!(One.combine(One), One);
        assert_eq!(Unknown.combine(Unknown), Unknown);
        // Disagreement
        assert_eq!(Zero.combine(One), Error);
        assert_eq!(One.combine(Zero), Error);
        // Unknown yields to defined
        assert_eq!(Zero.combine(Unknown), Zero);
        assert_eq!(Unknown.combine(One), One);
        // Error absorbs
        assert_eq!(Error.combine(Zero), Error);
        assert_eq!(One.combine(Error), Error);
        assert_eq!(Unknown.combine(Error), Error);
        assert_eq!(Error.combine(Error), Error);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{Zero}"), "0");
        assert_eq!(format!("{One}"), "1");
        assert_eq!(format!("{Unknown}"), "x");
        assert_eq!(format!("{Error}"), "E");
    }

    #[test]
    fn from_char_valid() {
        assert_eq!(Logic::from_char('0'), Some(Zero));
        assert_eq!(Logic::from_char('1'), Some(One));
        assert_eq!(Logic::from_char('x'), Some(Unknown));
        assert_eq!(Logic::from_char('X'), Some(Unknown));
        assert_eq!(Logic::from_char('u'), Some(Unknown));
        assert_eq!(Logic::from_char('E'), Some(Error));
        assert_eq!(Logic::from_char('e'), Some(Error));
    }

    #[test]
    fn from_char_invalid() {
        assert_eq!(Logic::from_char('z'), None);
        assert_eq!(Logic::from_char('2'), None);
    }

    #[test]
    fn defined_states() {
        assert!(Zero.is_defined());
        assert!(One.is_defined());
        assert!(!Unknown.is_defined());
        assert!(!Error.is_defined());
        assert_eq!(Logic::from_bool(true), One);
        assert_eq!(Logic::from_bool(false), Zero);
    }

    proptest! {
        #[test]
        fn combine_is_commutative(a in any_logic(), b in any_logic()) {
            prop_assert_eq!(a.combine(b), b.combine(a));
        }

        #[test]
        fn combine_is_associative(a in any_logic(), b in any_logic(), c in any_logic()) {
            prop_assert_eq!(a.combine(b).combine(c), a.combine(b.combine(c)));
        }

        #[test]
        fn unknown_is_identity(a in any_logic()) {
            prop_assert_eq!(a.combine(Unknown), a);
        }

        #[test]
        fn error_absorbs(a in any_logic()) {
            prop_assert_eq!(a.combine(Error), Error);
        }
    }
}
