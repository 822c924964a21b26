//! The virtual per-bit net layer of bit-labeled tunnels.
//!
//! Each net label gets one synthetic 1-bit bundle whose thread every bit
//! naming that label joins. Literal `0`/`1` tokens on output tunnels join a
//! synthetic constant bundle carrying the matching pull. Don't-care bits and
//! literals on input tunnels are left alone.

use std::collections::HashMap;

use log::trace;
use wirenet_common::{Ident, Logic};

use super::Layout;
use crate::bitspec::{parse_bit_spec, BitToken};
use crate::circuit::Direction;
use crate::ids::ThreadId;

impl Layout<'_> {
    pub(super) fn connect_bit_labeled_tunnels(&mut self) {
        let circuit = self.circuit;
        let mut nets: HashMap<Ident, ThreadId> = HashMap::new();
        let mut constants: HashMap<Logic, ThreadId> = HashMap::new();

        for (id, tunnel) in circuit.bit_tunnels() {
            let Some(&bundle) = self.point_to_bundle.get(&tunnel.location) else {
                continue;
            };
            let Some(threads) = self.bundles[bundle].threads.clone() else {
                trace!("bit tunnel {id} sits on unresolved {bundle}; skipping its nets");
                continue;
            };
            let tokens = parse_bit_spec(&tunnel.bit_spec, tunnel.width);
            for (token, &thread) in tokens.iter().zip(&threads) {
                let net = match token {
                    BitToken::Net(label) => {
                        let label = circuit.interner().get_or_intern(label);
                        match nets.get(&label) {
                            Some(&net) => net,
                            None => {
                                let net = self.alloc_synthetic(None);
                                nets.insert(label, net);
                                net
                            }
                        }
                    }
                    BitToken::Zero | BitToken::One if tunnel.direction == Direction::Output => {
                        let value = if *token == BitToken::One {
                            Logic::One
                        } else {
                            Logic::Zero
                        };
                        match constants.get(&value) {
                            Some(&net) => net,
                            None => {
                                let net = self.alloc_synthetic(Some(value));
                                constants.insert(value, net);
                                net
                            }
                        }
                    }
                    _ => continue,
                };
                self.threads.union(thread, net);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::build::build_bundle_map;
    use crate::circuit::{BitTunnel, Circuit, Direction};
    use crate::point::Point;
    use wirenet_common::Logic;

    fn thread_at(map: &crate::bundle_map::BundleMap, point: Point, bit: usize) -> crate::ids::ThreadId {
        let bundle = map.bundle(map.bundle_at(point).unwrap());
        bundle.threads().unwrap()[bit]
    }

    #[test]
    fn matching_labels_share_a_thread() {
        let mut circuit = Circuit::new();
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(0, 0), 1, "N7", Direction::Output));
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(90, 0), 1, "n007", Direction::Input));
        let map = build_bundle_map(&circuit).unwrap();
        assert_eq!(
            thread_at(&map, Point::new(0, 0), 0),
            thread_at(&map, Point::new(90, 0), 0)
        );
        // The bundles themselves stay apart; only the bit is shared.
        assert_ne!(map.bundle_at(Point::new(0, 0)), map.bundle_at(Point::new(90, 0)));
    }

    #[test]
    fn bits_join_by_position_in_bit_spec() {
        let mut circuit = Circuit::new();
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(0, 0), 2, "N1,N2", Direction::Output));
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(50, 0), 2, "N2,N1", Direction::Input));
        let map = build_bundle_map(&circuit).unwrap();
        assert_eq!(
            thread_at(&map, Point::new(0, 0), 0),
            thread_at(&map, Point::new(50, 0), 1)
        );
        assert_eq!(
            thread_at(&map, Point::new(0, 0), 1),
            thread_at(&map, Point::new(50, 0), 0)
        );
    }

    #[test]
    fn dont_care_bits_stay_floating() {
        let mut circuit = Circuit::new();
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(0, 0), 1, "x", Direction::Output));
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(50, 0), 1, "X", Direction::Output));
        let map = build_bundle_map(&circuit).unwrap();
        assert_ne!(
            thread_at(&map, Point::new(0, 0), 0),
            thread_at(&map, Point::new(50, 0), 0)
        );
        assert_eq!(map.bundle_count(), 2);
    }

    #[test]
    fn output_constant_joins_pulled_net() {
        let mut circuit = Circuit::new();
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(0, 0), 2, "1,x", Direction::Output));
        let map = build_bundle_map(&circuit).unwrap();
        let thread = map.thread(thread_at(&map, Point::new(0, 0), 0));
        let pulls: Vec<Option<Logic>> = thread
            .members()
            .iter()
            .map(|m| map.bundle(m.bundle).pull())
            .collect();
        assert!(pulls.contains(&Some(Logic::One)));
    }

    #[test]
    fn input_constant_is_ignored() {
        let mut circuit = Circuit::new();
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(0, 0), 1, "1", Direction::Input));
        let map = build_bundle_map(&circuit).unwrap();
        let thread = map.thread(thread_at(&map, Point::new(0, 0), 0));
        assert_eq!(thread.members().len(), 1);
        assert_eq!(map.bundle_count(), 1);
    }

    #[test]
    fn invalid_bundle_contributes_no_nets() {
        let mut circuit = Circuit::new();
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(0, 0), 1, "N1", Direction::Output));
        circuit.add_port((0, 0), 2);
        let map = build_bundle_map(&circuit).unwrap();
        assert_eq!(map.bundle_count(), 1);
        assert_eq!(map.thread_count(), 0);
    }

    #[test]
    fn label_nets_independent_of_plain_tunnel_labels() {
        let mut circuit = Circuit::new();
        circuit.add_tunnel((0, 0), 1, "N7");
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(50, 0), 1, "N7", Direction::Output));
        let map = build_bundle_map(&circuit).unwrap();
        assert_ne!(
            thread_at(&map, Point::new(0, 0), 0),
            thread_at(&map, Point::new(50, 0), 0)
        );
    }
}
