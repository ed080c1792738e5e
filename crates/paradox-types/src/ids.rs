//! Type-safe identifier wrappers around stable integer indices.
//!
//! Planets, players, and universes live in fixed arenas that are set up
//! once per match, so every identifier is a plain index into its arena.
//! Wrapping them in distinct newtypes keeps a planet index from being
//! passed where a player index is expected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around an integer index with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub $inner);

        impl $name {
            /// Create an identifier from its raw value.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the raw value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }

            /// Return the identifier as an arena index.
            ///
            /// Saturates at `usize::MAX` on targets where the raw value
            /// does not fit, which no arena lookup will ever match.
            pub fn index(self) -> usize {
                usize::try_from(self.0).unwrap_or(usize::MAX)
            }

            /// Build an identifier from an arena index, if it fits.
            pub fn from_index(index: usize) -> Option<Self> {
                <$inner>::try_from(index).ok().map(Self)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }
    };
}

define_id! {
    /// Index of a planet in the topology's planet registry.
    PlanetId(u32)
}

define_id! {
    /// Index of a player (0-based, dense).
    PlayerId(u32)
}

define_id! {
    /// Index of a universe (one parallel timeline).
    UniverseId(u32)
}

define_id! {
    /// Per-universe command identifier, assigned in admission order.
    CommandId(u64)
}
