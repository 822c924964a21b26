//! The editable circuit topology and its version counter.
//!
//! [`Circuit`] owns every element the bundle builders consume: wire
//! segments, splitters, label tunnels, bit-labeled tunnels, pull resistors,
//! and the width-declaring ports of ordinary components. Every structural
//! edit and every attribute change that can affect bundles bumps the
//! [`TopologyVersion`]; the cached [`BundleMap`] is rebuilt lazily the next
//! time a query needs it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use wirenet_common::{Ident, Interner, Logic};

use crate::build;
use crate::bundle_map::BundleMap;
use crate::cache::BundleMapCache;
use crate::config::EngineConfig;
use crate::diagnostics::WidthIncompatibility;
use crate::error::EngineError;
use crate::ids::{BitTunnelId, BundleId, PortId, PullId, SplitterId, TunnelId, WireId};
use crate::point::Point;

/// Monotonic counter identifying one state of a circuit's topology.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct TopologyVersion(u64);

impl TopologyVersion {
    /// Returns the raw counter value.
    pub fn as_raw(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TopologyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A drawn wire between two points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireSegment {
    /// First endpoint.
    pub a: Point,
    /// Second endpoint.
    pub b: Point,
}

/// One end of a splitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitterEnd {
    /// Where the end connects.
    pub location: Point,
    /// The end's bit width.
    pub width: u32,
}

/// A component fanning a combined bus out into separately wired ends.
///
/// End 0 is the combined end; ends `1..=N` are the split ends. For each bit
/// `i` of the combined end, `bit_end[i]` names the split end carrying it
/// (0 leaves the bit unconnected) and `bit_thread[i]` the bit position on
/// that end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splitter {
    ends: Vec<SplitterEnd>,
    bit_end: Vec<u32>,
    bit_thread: Vec<u32>,
}

impl Splitter {
    /// Creates a splitter from raw routing tables.
    ///
    /// The tables are not checked here; out-of-range entries are reported as
    /// [`BuildError::SplitterIndex`](crate::error::BuildError::SplitterIndex)
    /// when the bundle map is built.
    pub fn new(ends: Vec<SplitterEnd>, bit_end: Vec<u32>, bit_thread: Vec<u32>) -> Self {
        Self {
            ends,
            bit_end,
            bit_thread,
        }
    }

    /// Creates a splitter that lays consecutive combined bits onto the split
    /// ends in order: the first group takes bits `0..w0`, the next
    /// `w0..w0+w1`, and so on.
    pub fn from_groups(combined: Point, groups: &[(Point, u32)]) -> Self {
        let width: u32 = groups.iter().map(|&(_, w)| w).sum();
        let mut ends = vec![SplitterEnd {
            location: combined,
            width,
        }];
        let mut bit_end = Vec::with_capacity(width as usize);
        let mut bit_thread = Vec::with_capacity(width as usize);
        for (index, &(location, group_width)) in groups.iter().enumerate() {
            ends.push(SplitterEnd {
                location,
                width: group_width,
            });
            for offset in 0..group_width {
                bit_end.push(index as u32 + 1);
                bit_thread.push(offset);
            }
        }
        Self::new(ends, bit_end, bit_thread)
    }

    /// All ends, combined end first.
    pub fn ends(&self) -> &[SplitterEnd] {
        &self.ends
    }

    /// Split-end index for each combined bit.
    pub fn bit_end(&self) -> &[u32] {
        &self.bit_end
    }

    /// Bit position on the split end for each combined bit.
    pub fn bit_thread(&self) -> &[u32] {
        &self.bit_thread
    }
}

/// A plain tunnel joining every tunnel that shares its label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tunnel {
    /// Where the tunnel connects.
    pub location: Point,
    /// Declared bit width.
    pub width: u32,
    /// Trimmed, non-empty label; `None` leaves the tunnel unconnected.
    pub label: Option<Ident>,
}

/// Whether a bit-labeled tunnel feeds its label nets or reads them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Reads from the label nets; literal constants are ignored.
    Input,
    /// Drives the label nets; literal constants are applied.
    Output,
}

/// Which way a bit-labeled tunnel is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    /// Pointing east.
    #[default]
    East,
    /// Pointing west.
    West,
    /// Pointing north.
    North,
    /// Pointing south.
    South,
}

/// A tunnel whose individual bits are aliased to named nets or constants by
/// a comma-separated bit spec (see [`bitspec`](crate::bitspec)).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitTunnel {
    /// Where the tunnel connects.
    pub location: Point,
    /// Declared bit width.
    pub width: u32,
    /// Comma-separated per-bit tokens, bit 0 first.
    pub bit_spec: String,
    /// Input or output.
    pub direction: Direction,
    /// Drawing orientation.
    pub facing: Facing,
}

impl BitTunnel {
    /// Creates an east-facing bit-labeled tunnel.
    pub fn new(location: Point, width: u32, bit_spec: &str, direction: Direction) -> Self {
        Self {
            location,
            width,
            bit_spec: bit_spec.to_string(),
            direction,
            facing: Facing::default(),
        }
    }
}

/// A weak driver supplying a default for undriven bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PullResistor {
    /// The resistor's single pin.
    pub location: Point,
    /// Declared bit width.
    pub width: u32,
    /// The value pulled towards.
    pub pull: Logic,
}

/// A component end that declares a bit width at a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Port {
    /// Where the end connects.
    pub location: Point,
    /// Declared bit width.
    pub width: u32,
}

/// An editable circuit topology with a lazily rebuilt bundle map.
///
/// Edits take `&mut self`; queries take `&self`, so any number of threads
/// may query a shared circuit at once. Only one of them builds the bundle map
/// for a given version while the others wait for it.
pub struct Circuit {
    config: EngineConfig,
    interner: Interner,
    wires: BTreeMap<WireId, WireSegment>,
    splitters: BTreeMap<SplitterId, Splitter>,
    tunnels: BTreeMap<TunnelId, Tunnel>,
    bit_tunnels: BTreeMap<BitTunnelId, BitTunnel>,
    pulls: BTreeMap<PullId, PullResistor>,
    ports: BTreeMap<PortId, Port>,
    next_id: u32,
    version: TopologyVersion,
    cache: BundleMapCache,
}

impl Circuit {
    /// Creates an empty circuit with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an empty circuit with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            interner: Interner::new(),
            wires: BTreeMap::new(),
            splitters: BTreeMap::new(),
            tunnels: BTreeMap::new(),
            bit_tunnels: BTreeMap::new(),
            pulls: BTreeMap::new(),
            ports: BTreeMap::new(),
            next_id: 0,
            version: TopologyVersion::default(),
            cache: BundleMapCache::new(),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current topology version.
    pub fn version(&self) -> TopologyVersion {
        self.version
    }

    /// The interner holding tunnel labels and bit-spec net labels.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// The snapshot cache, for observing build activity.
    pub fn cache(&self) -> &BundleMapCache {
        &self.cache
    }

    fn touch(&mut self) {
        self.version = self.version.next();
        self.cache.invalidate();
    }

    fn next_raw(&mut self) -> u32 {
        let raw = self.next_id;
        self.next_id += 1;
        raw
    }

    fn intern_label(&self, label: &str) -> Option<Ident> {
        let label = label.trim();
        (!label.is_empty()).then(|| self.interner.get_or_intern(label))
    }

    // ---- wires ----

    /// Draws a wire between two points.
    pub fn add_wire(&mut self, a: impl Into<Point>, b: impl Into<Point>) -> WireId {
        let id = WireId::from_raw(self.next_raw());
        self.wires.insert(
            id,
            WireSegment {
                a: a.into(),
                b: b.into(),
            },
        );
        self.touch();
        id
    }

    /// Deletes a wire.
    pub fn remove_wire(&mut self, id: WireId) -> Result<WireSegment, EngineError> {
        let wire = self.wires.remove(&id).ok_or(unknown("wire", id.as_raw()))?;
        self.touch();
        Ok(wire)
    }

    /// Iterates over all wires.
    pub fn wires(&self) -> impl Iterator<Item = (WireId, &WireSegment)> {
        self.wires.iter().map(|(&id, w)| (id, w))
    }

    // ---- splitters ----

    /// Places a splitter.
    pub fn add_splitter(&mut self, splitter: Splitter) -> SplitterId {
        let id = SplitterId::from_raw(self.next_raw());
        self.splitters.insert(id, splitter);
        self.touch();
        id
    }

    /// Deletes a splitter.
    pub fn remove_splitter(&mut self, id: SplitterId) -> Result<Splitter, EngineError> {
        let splitter = self
            .splitters
            .remove(&id)
            .ok_or(unknown("splitter", id.as_raw()))?;
        self.touch();
        Ok(splitter)
    }

    /// Iterates over all splitters.
    pub fn splitters(&self) -> impl Iterator<Item = (SplitterId, &Splitter)> {
        self.splitters.iter().map(|(&id, s)| (id, s))
    }

    // ---- label tunnels ----

    /// Places a label tunnel. Blank labels leave the tunnel unconnected.
    pub fn add_tunnel(&mut self, location: impl Into<Point>, width: u32, label: &str) -> TunnelId {
        let id = TunnelId::from_raw(self.next_raw());
        let tunnel = Tunnel {
            location: location.into(),
            width,
            label: self.intern_label(label),
        };
        self.tunnels.insert(id, tunnel);
        self.touch();
        id
    }

    /// Changes a tunnel's label.
    pub fn set_tunnel_label(&mut self, id: TunnelId, label: &str) -> Result<(), EngineError> {
        let label = self.intern_label(label);
        let tunnel = self
            .tunnels
            .get_mut(&id)
            .ok_or(unknown("tunnel", id.as_raw()))?;
        if tunnel.label != label {
            tunnel.label = label;
            self.touch();
        }
        Ok(())
    }

    /// Changes a tunnel's width.
    pub fn set_tunnel_width(&mut self, id: TunnelId, width: u32) -> Result<(), EngineError> {
        let tunnel = self
            .tunnels
            .get_mut(&id)
            .ok_or(unknown("tunnel", id.as_raw()))?;
        if tunnel.width != width {
            tunnel.width = width;
            self.touch();
        }
        Ok(())
    }

    /// Deletes a tunnel.
    pub fn remove_tunnel(&mut self, id: TunnelId) -> Result<Tunnel, EngineError> {
        let tunnel = self
            .tunnels
            .remove(&id)
            .ok_or(unknown("tunnel", id.as_raw()))?;
        self.touch();
        Ok(tunnel)
    }

    /// Returns a tunnel's label text.
    pub fn tunnel_label(&self, id: TunnelId) -> Option<&str> {
        let label = self.tunnels.get(&id)?.label?;
        Some(self.interner.resolve(label))
    }

    /// Iterates over all label tunnels.
    pub fn tunnels(&self) -> impl Iterator<Item = (TunnelId, &Tunnel)> {
        self.tunnels.iter().map(|(&id, t)| (id, t))
    }

    // ---- bit-labeled tunnels ----

    /// Places a bit-labeled tunnel.
    pub fn add_bit_tunnel(&mut self, tunnel: BitTunnel) -> BitTunnelId {
        let id = BitTunnelId::from_raw(self.next_raw());
        self.bit_tunnels.insert(id, tunnel);
        self.touch();
        id
    }

    fn bit_tunnel_mut(&mut self, id: BitTunnelId) -> Result<&mut BitTunnel, EngineError> {
        self.bit_tunnels
            .get_mut(&id)
            .ok_or(unknown("bit tunnel", id.as_raw()))
    }

    /// Changes a bit-labeled tunnel's bit spec.
    pub fn set_bit_spec(&mut self, id: BitTunnelId, bit_spec: &str) -> Result<(), EngineError> {
        let tunnel = self.bit_tunnel_mut(id)?;
        if tunnel.bit_spec != bit_spec {
            tunnel.bit_spec = bit_spec.to_string();
            self.touch();
        }
        Ok(())
    }

    /// Changes a bit-labeled tunnel's direction.
    pub fn set_bit_tunnel_direction(
        &mut self,
        id: BitTunnelId,
        direction: Direction,
    ) -> Result<(), EngineError> {
        let tunnel = self.bit_tunnel_mut(id)?;
        if tunnel.direction != direction {
            tunnel.direction = direction;
            self.touch();
        }
        Ok(())
    }

    /// Changes a bit-labeled tunnel's width.
    pub fn set_bit_tunnel_width(&mut self, id: BitTunnelId, width: u32) -> Result<(), EngineError> {
        let tunnel = self.bit_tunnel_mut(id)?;
        if tunnel.width != width {
            tunnel.width = width;
            self.touch();
        }
        Ok(())
    }

    /// Changes a bit-labeled tunnel's facing.
    pub fn set_bit_tunnel_facing(&mut self, id: BitTunnelId, facing: Facing) -> Result<(), EngineError> {
        let tunnel = self.bit_tunnel_mut(id)?;
        if tunnel.facing != facing {
            tunnel.facing = facing;
            self.touch();
        }
        Ok(())
    }

    /// Deletes a bit-labeled tunnel.
    pub fn remove_bit_tunnel(&mut self, id: BitTunnelId) -> Result<BitTunnel, EngineError> {
        let tunnel = self
            .bit_tunnels
            .remove(&id)
            .ok_or(unknown("bit tunnel", id.as_raw()))?;
        self.touch();
        Ok(tunnel)
    }

    /// Iterates over all bit-labeled tunnels.
    pub fn bit_tunnels(&self) -> impl Iterator<Item = (BitTunnelId, &BitTunnel)> {
        self.bit_tunnels.iter().map(|(&id, t)| (id, t))
    }

    // ---- pull resistors ----

    /// Places a pull resistor.
    pub fn add_pull_resistor(&mut self, location: impl Into<Point>, width: u32, pull: Logic) -> PullId {
        let id = PullId::from_raw(self.next_raw());
        let resistor = PullResistor {
            location: location.into(),
            width,
            pull,
        };
        self.pulls.insert(id, resistor);
        self.touch();
        id
    }

    /// Changes the value a pull resistor pulls towards.
    pub fn set_pull(&mut self, id: PullId, pull: Logic) -> Result<(), EngineError> {
        let resistor = self
            .pulls
            .get_mut(&id)
            .ok_or(unknown("pull resistor", id.as_raw()))?;
        if resistor.pull != pull {
            resistor.pull = pull;
            self.touch();
        }
        Ok(())
    }

    /// Deletes a pull resistor.
    pub fn remove_pull_resistor(&mut self, id: PullId) -> Result<PullResistor, EngineError> {
        let resistor = self
            .pulls
            .remove(&id)
            .ok_or(unknown("pull resistor", id.as_raw()))?;
        self.touch();
        Ok(resistor)
    }

    /// Iterates over all pull resistors.
    pub fn pull_resistors(&self) -> impl Iterator<Item = (PullId, &PullResistor)> {
        self.pulls.iter().map(|(&id, p)| (id, p))
    }

    // ---- component ports ----

    /// Registers a component end declaring `width` at `location`.
    pub fn add_port(&mut self, location: impl Into<Point>, width: u32) -> PortId {
        let id = PortId::from_raw(self.next_raw());
        let port = Port {
            location: location.into(),
            width,
        };
        self.ports.insert(id, port);
        self.touch();
        id
    }

    /// Changes a port's declared width.
    pub fn set_port_width(&mut self, id: PortId, width: u32) -> Result<(), EngineError> {
        let port = self
            .ports
            .get_mut(&id)
            .ok_or(unknown("port", id.as_raw()))?;
        if port.width != width {
            port.width = width;
            self.touch();
        }
        Ok(())
    }

    /// Removes a port.
    pub fn remove_port(&mut self, id: PortId) -> Result<Port, EngineError> {
        let port = self.ports.remove(&id).ok_or(unknown("port", id.as_raw()))?;
        self.touch();
        Ok(port)
    }

    /// Iterates over all ports.
    pub fn ports(&self) -> impl Iterator<Item = (PortId, &Port)> {
        self.ports.iter().map(|(&id, p)| (id, p))
    }

    // ---- queries ----

    /// Returns the bundle map for the current version, building it if needed.
    ///
    /// Blocks while another thread is building the same version.
    pub fn bundle_map(&self) -> Arc<BundleMap> {
        self.cache.get_or_build(self.version, || {
            build::build_with_retry(self.version, self.config.max_build_attempts, |_| {
                build::build_bundle_map(self)
            })
        })
    }

    /// The bundle containing `point` in the current snapshot.
    pub fn bundle_at(&self, point: impl Into<Point>) -> Option<BundleId> {
        self.bundle_map().bundle_at(point.into())
    }

    /// The resolved width at `point`, or `None` if unknown or conflicting.
    pub fn width_at(&self, point: impl Into<Point>) -> Option<u32> {
        self.bundle_map().width_at(point.into())
    }

    /// Width conflicts in the current snapshot, for UI reporting.
    pub fn width_incompatibilities(&self) -> Vec<WidthIncompatibility> {
        self.bundle_map().incompatibilities().to_vec()
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown(kind: &'static str, id: u32) -> EngineError {
    EngineError::UnknownElement { kind, id }
}
