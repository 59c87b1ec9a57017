//! Element identifiers and element-type bitsets for the semantic graph.
//!
//! The graph store itself is an external collaborator (see [`crate::store`]); this
//! module only defines the opaque handle type and the type bitset that the core
//! reasons about when matching templates and building replacement tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle into the semantic graph. Totally ordered, hashable, and cheap to
/// copy — implementations back this with whatever the underlying store uses
/// (an index, a generation-checked slot, a UUID) but the core never inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    pub fn new(raw: u64) -> Self {
        ElementId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Minimal bitset macro: generates a `u16`-backed newtype with `contains`,
/// `union`/`|`, `intersection`/`&`. The flag set here is small and fixed, so a
/// hand-rolled bitset avoids pulling in the `bitflags` crate for ten constants.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $repr:ty {
            $(const $variant:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
        pub struct $name($repr);

        impl $name {
            $(pub const $variant: $name = $name($value);)*

            pub const fn empty() -> Self {
                $name(0)
            }

            pub const fn contains(self, other: Self) -> bool {
                (self.0 & other.0) == other.0
            }

            pub const fn union(self, other: Self) -> Self {
                $name(self.0 | other.0)
            }

            pub const fn intersection(self, other: Self) -> Self {
                $name(self.0 & other.0)
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl std::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                self.intersection(rhs)
            }
        }
    };
}

bitflags_like! {
    /// Bitset distinguishing node vs. edge, constant vs. variable, access-edge vs.
    /// common-edge, link vs. non-link, plus orientation/permanence flags. Edges are
    /// first-class and themselves addressable, so an `ElementId` tagged `EDGE` is
    /// just as valid a key in a `Replacements` table as one tagged `NODE`.
    pub struct ElementType: u16 {
        const NODE        = 1 << 0;
        const EDGE        = 1 << 1;
        const CONST       = 1 << 2;
        const VAR         = 1 << 3;
        const ACCESS_EDGE = 1 << 4;
        const COMMON_EDGE = 1 << 5;
        const LINK        = 1 << 6;
        const NON_LINK    = 1 << 7;
        const FORWARD     = 1 << 8;
        const PERMANENT   = 1 << 9;
    }
}

impl ElementType {
    pub fn is_node(self) -> bool {
        self.contains(ElementType::NODE)
    }

    pub fn is_edge(self) -> bool {
        self.contains(ElementType::EDGE)
    }

    pub fn is_var(self) -> bool {
        self.contains(ElementType::VAR)
    }

    pub fn is_const(self) -> bool {
        self.contains(ElementType::CONST)
    }

    pub fn is_access_edge(self) -> bool {
        self.contains(ElementType::ACCESS_EDGE)
    }

    pub fn is_link(self) -> bool {
        self.contains(ElementType::LINK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_type_composition() {
        let t = ElementType::NODE | ElementType::VAR;
        assert!(t.is_node());
        assert!(t.is_var());
        assert!(!t.is_edge());
    }

    #[test]
    fn element_id_ordering() {
        let a = ElementId::new(1);
        let b = ElementId::new(2);
        assert!(a < b);
        assert_eq!(a, ElementId::new(1));
    }
}
