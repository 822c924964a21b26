//! Opaque ID newtypes for circuit elements and snapshot records.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, `Ord`, and
//! `Serialize`/`Deserialize`. Circuit element IDs are handed out by
//! [`Circuit`](crate::circuit::Circuit); bundle and thread IDs are only
//! meaningful within the [`BundleMap`](crate::bundle_map::BundleMap) that
//! allocated them.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub const fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub const fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a drawn wire segment.
    WireId,
    "w"
);

define_id!(
    /// Opaque, copyable ID for a splitter component.
    SplitterId,
    "s"
);

define_id!(
    /// Opaque, copyable ID for a plain label tunnel.
    TunnelId,
    "t"
);

define_id!(
    /// Opaque, copyable ID for a bit-labeled virtual tunnel.
    BitTunnelId,
    "bt"
);

define_id!(
    /// Opaque, copyable ID for a pull resistor.
    PullId,
    "pr"
);

define_id!(
    /// Opaque, copyable ID for a width-declaring component port.
    PortId,
    "p"
);

define_id!(
    /// Opaque, copyable ID for a bundle within one snapshot.
    BundleId,
    "b"
);

define_id!(
    /// Opaque, copyable ID for a thread within one snapshot.
    ThreadId,
    "th"
);

define_id!(
    /// Opaque, copyable ID naming a component that drives values onto points.
    DriverId,
    "d"
);
