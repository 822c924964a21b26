//! Wire-network resolution and signal propagation for digital logic
//! simulation.
//!
//! Given the wires, splitters, label tunnels, pull resistors, and
//! bit-labeled tunnels of a [`Circuit`], this crate partitions every
//! connection point into bundles that carry one multi-bit value, splits each
//! bundle into per-bit threads that may cross splitters and label nets,
//! reports bundles whose contributors disagree on width, and resolves the
//! value at every point from the values components drive.
//!
//! # Architecture
//!
//! Every edit bumps the circuit's [`TopologyVersion`]. The first query after
//! an edit builds a new immutable [`BundleMap`] through a single-flight
//! cache; concurrent readers of the same version wait for that one build.
//! Each [`SimState`] caches resolved thread values tagged with the snapshot
//! they belong to, so [`propagate`] only recomputes what changed unless the
//! topology moved underneath it.
//!
//! # Usage
//!
//! ```ignore
//! use wirenet_engine::{propagate, Circuit, DriverId, SimState};
//! use wirenet_common::Value;
//!
//! let mut circuit = Circuit::new();
//! circuit.add_wire((0, 0), (10, 0));
//! circuit.add_port((0, 0), 1);
//!
//! let mut state = SimState::new();
//! state.drive((0, 0), DriverId::from_raw(0), Value::from_bool(true));
//! propagate(&circuit, &mut state, [(0, 0).into()])?;
//! assert_eq!(state.value_at((10, 0)), Value::from_bool(true));
//! ```
//!
//! # Modules
//!
//! - `circuit`: Editable topology and version counter
//! - `bitspec`: Bit-labeled tunnel spec parsing
//! - `bundle_map`: Immutable bundle/thread snapshots
//! - `cache`: Single-flight snapshot cache
//! - `state`: Driven values, wire values, thread cache
//! - `propagate`: Value resolution
//! - `config`: TOML engine configuration

#![warn(missing_docs)]

pub mod arena;
pub mod bitspec;
mod build;
pub mod bundle_map;
pub mod cache;
pub mod circuit;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod point;
pub mod propagate;
pub mod state;

pub use arena::{Arena, ArenaId};
pub use bitspec::{normalize_token, parse_bit_spec, BitToken};
pub use bundle_map::{
    BuildOutcome, Bundle, BundleMap, DegradedReason, MapId, Thread, ThreadMember,
};
pub use cache::BundleMapCache;
pub use circuit::{
    BitTunnel, Circuit, Direction, Facing, Port, PullResistor, Splitter, SplitterEnd,
    TopologyVersion, Tunnel, WireSegment,
};
pub use config::{load_config, load_config_from_str, EngineConfig, DEFAULT_MAX_BUILD_ATTEMPTS};
pub use diagnostics::WidthIncompatibility;
pub use error::{BuildError, ConfigError, EngineError};
pub use ids::{BitTunnelId, BundleId, DriverId, PortId, PullId, SplitterId, ThreadId, WireId};
pub use point::Point;
pub use propagate::{propagate, propagate_all};
pub use state::{Drive, SimState};
