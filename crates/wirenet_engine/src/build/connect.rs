//! Point-level unions: wires, label tunnels, pull resistors, and the anchor
//! points of bit-labeled tunnels and component ports.

use std::collections::BTreeMap;

use wirenet_common::Ident;

use super::{merge_pull, Builder};
use crate::point::Point;

impl Builder<'_> {
    /// Unions the bundles at both endpoints of every wire.
    pub(super) fn connect_wires(&mut self) {
        let circuit = self.circuit;
        for (_, wire) in circuit.wires() {
            let a = self.bundle_for(wire.a);
            let b = self.bundle_for(wire.b);
            self.sets.union(a, b);
        }
    }

    /// Unions every tunnel sharing a label. Unlabeled tunnels only declare
    /// their width at their own point.
    pub(super) fn connect_tunnels(&mut self) {
        let circuit = self.circuit;
        let mut groups: BTreeMap<Ident, Vec<Point>> = BTreeMap::new();
        for (_, tunnel) in circuit.tunnels() {
            self.bundle_for(tunnel.location);
            self.declare_width(tunnel.location, tunnel.width);
            if let Some(label) = tunnel.label {
                groups.entry(label).or_default().push(tunnel.location);
            }
        }
        for points in groups.values() {
            let Some((&first, rest)) = points.split_first() else {
                continue;
            };
            let first = self.bundle_for(first);
            for &point in rest {
                let other = self.bundle_for(point);
                self.sets.union(first, other);
            }
        }
    }

    /// Ensures a bundle at every pull resistor pin and accumulates the pull.
    pub(super) fn connect_pull_resistors(&mut self) {
        let circuit = self.circuit;
        for (_, resistor) in circuit.pull_resistors() {
            let id = self.bundle_for(resistor.location);
            self.declare_width(resistor.location, resistor.width);
            merge_pull(&mut self.work[id.as_raw() as usize].pull, resistor.pull);
        }
    }

    /// Ensures a bundle at every bit-labeled tunnel. Their per-bit nets are
    /// joined later, once threads exist.
    pub(super) fn anchor_bit_tunnels(&mut self) {
        let circuit = self.circuit;
        for (_, tunnel) in circuit.bit_tunnels() {
            self.bundle_for(tunnel.location);
            self.declare_width(tunnel.location, tunnel.width);
        }
    }

    /// Records port widths. Ports never create bundles of their own.
    pub(super) fn declare_port_widths(&mut self) {
        let circuit = self.circuit;
        for (_, port) in circuit.ports() {
            self.declare_width(port.location, port.width);
        }
    }
}
