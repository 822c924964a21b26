//! Resolution of driven values into per-point wire values.
//!
//! [`propagate`] recomputes only the threads reachable from the changed
//! points, using the state's thread cache for everything else. When the
//! cache was computed against a different snapshot, every thread is
//! recomputed.

use std::collections::BTreeSet;

use log::{debug, trace};
use wirenet_common::{Logic, Value};

use crate::bundle_map::{BuildOutcome, Bundle, BundleMap};
use crate::circuit::Circuit;
use crate::error::EngineError;
use crate::ids::ThreadId;
use crate::point::Point;
use crate::state::SimState;

/// Resolves the values at `changed` and everything connected to them.
///
/// Points outside any bundle take their driven value directly. Points in an
/// invalid bundle, or one of unknown width, resolve to NIL. Every other
/// bundle resolves bit by bit from the combined drivers on each thread,
/// falling back to the pull when a bit is otherwise unknown.
///
/// # Errors
///
/// Returns [`EngineError::FatalBuild`] if the current topology cannot be
/// built into a bundle map.
pub fn propagate(
    circuit: &Circuit,
    state: &mut SimState,
    changed: impl IntoIterator<Item = Point>,
) -> Result<(), EngineError> {
    let map = circuit.bundle_map();
    if let BuildOutcome::Fatal(err) = map.outcome() {
        return Err(EngineError::FatalBuild(err.clone()));
    }

    let mut dirty: BTreeSet<ThreadId> = BTreeSet::new();
    let mut pending: BTreeSet<Point> = changed.into_iter().collect();

    if state.thread_cache_tag() != Some(map.id()) {
        debug!(
            "thread cache stale; resolving all {} threads of {}",
            map.thread_count(),
            map.version()
        );
        state.reset_thread_cache(map.id(), map.thread_count());
        pending.extend(state.wire_points());
        pending.extend(state.driven_points());
        for (_, bundle) in map.bundles() {
            match bundle.threads() {
                Some(threads) => dirty.extend(threads.iter().copied()),
                None => broadcast(state, bundle, &Value::nil()),
            }
        }
    }

    for point in pending {
        let Some(id) = map.bundle_at(point) else {
            let value = state.driven_at(point);
            state.set_wire_value(point, value);
            continue;
        };
        let bundle = map.bundle(id);
        match bundle.threads() {
            Some(threads) => dirty.extend(threads.iter().copied()),
            None => broadcast(state, bundle, &Value::nil()),
        }
    }

    trace!("propagating {} dirty threads", dirty.len());
    let mut touched = BTreeSet::new();
    for &thread in &dirty {
        let value = resolve_thread(&map, state, thread);
        state.store_thread_value(thread, value);
        touched.extend(map.thread(thread).members().iter().map(|m| m.bundle));
    }

    for id in touched {
        let bundle = map.bundle(id);
        let Some(threads) = bundle.threads() else {
            continue;
        };
        if bundle.points().is_empty() {
            continue;
        }
        let bits: Vec<Logic> = threads
            .iter()
            .map(|&t| state.cached_thread_value(t).unwrap_or(Logic::Unknown))
            .collect();
        broadcast(state, bundle, &Value::from_bits(&bits));
    }
    Ok(())
}

/// Resolves every point of the circuit from scratch.
///
/// Used after loading a circuit or replacing a whole simulation state.
pub fn propagate_all(circuit: &Circuit, state: &mut SimState) -> Result<(), EngineError> {
    state.clear_thread_cache();
    propagate(circuit, state, std::iter::empty::<Point>())
}

/// Combines every driver on every point of every bundle the thread passes
/// through, at the thread's offset in that bundle.
fn resolve_thread(map: &BundleMap, state: &SimState, thread: ThreadId) -> Logic {
    let mut value = Logic::Unknown;
    let mut pull = Logic::Unknown;
    for member in map.thread(thread).members() {
        let bundle = map.bundle(member.bundle);
        for &point in bundle.points() {
            for driven in state.driven_values_at(point) {
                let bit = driven.try_get(member.offset).unwrap_or(Logic::Unknown);
                value = value.combine(bit);
            }
        }
        if let Some(p) = bundle.pull() {
            pull = pull.combine(p);
        }
    }
    if value == Logic::Unknown {
        pull
    } else {
        value
    }
}

fn broadcast(state: &mut SimState, bundle: &Bundle, value: &Value) {
    for &point in bundle.points() {
        state.set_wire_value(point, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{BitTunnel, Direction, Splitter, SplitterEnd};
    use crate::error::BuildError;
    use crate::ids::DriverId;

    const A: DriverId = DriverId::from_raw(0);
    const B: DriverId = DriverId::from_raw(1);
    const NONE: [Point; 0] = [];

    fn wired(width: u32) -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_wire((0, 0), (10, 0));
        circuit.add_wire((10, 0), (20, 0));
        circuit.add_port((0, 0), width);
        circuit.add_port((20, 0), width);
        circuit
    }

    #[test]
    fn driven_value_reaches_every_point() {
        let circuit = wired(4);
        let mut state = SimState::new();
        state.drive((0, 0), A, Value::from_u64(0b1010, 4));
        propagate(&circuit, &mut state, [Point::new(0, 0)]).unwrap();
        for x in [0, 10, 20] {
            assert_eq!(state.value_at((x, 0)), Value::from_u64(0b1010, 4));
        }
        assert_eq!(state.take_changed().len(), 3);
    }

    #[test]
    fn undriven_bundle_is_unknown() {
        let circuit = wired(2);
        let mut state = SimState::new();
        propagate_all(&circuit, &mut state).unwrap();
        assert_eq!(state.value_at((10, 0)), Value::unknown(2));
    }

    #[test]
    fn conflicting_drivers_give_error() {
        let circuit = wired(1);
        let mut state = SimState::new();
        state.drive((0, 0), A, Value::from_bool(true));
        state.drive((20, 0), B, Value::from_bool(false));
        propagate(&circuit, &mut state, [Point::new(0, 0), Point::new(20, 0)]).unwrap();
        assert_eq!(state.value_at((10, 0)).get(0), Logic::Error);
    }

    #[test]
    fn pull_fills_undriven_bits() {
        let mut circuit = wired(2);
        circuit.add_pull_resistor((10, 0), 2, Logic::One);
        let mut state = SimState::new();
        state.drive((0, 0), A, Value::from_binary_str("x0").unwrap());
        propagate(&circuit, &mut state, [Point::new(0, 0)]).unwrap();
        assert_eq!(state.value_at((20, 0)), Value::from_u64(0b10, 2));
    }

    #[test]
    fn invalid_bundle_resolves_to_nil() {
        let mut circuit = wired(2);
        circuit.add_port((10, 0), 3);
        let mut state = SimState::new();
        state.drive((0, 0), A, Value::from_u64(1, 2));
        propagate(&circuit, &mut state, [Point::new(0, 0)]).unwrap();
        assert!(state.value_at((0, 0)).is_nil());
    }

    #[test]
    fn unwired_point_takes_driven_value() {
        let circuit = Circuit::new();
        let mut state = SimState::new();
        state.drive((7, 7), A, Value::from_u64(5, 3));
        propagate(&circuit, &mut state, [Point::new(7, 7)]).unwrap();
        assert_eq!(state.value_at((7, 7)), Value::from_u64(5, 3));
        state.release((7, 7), A);
        propagate(&circuit, &mut state, [Point::new(7, 7)]).unwrap();
        assert!(state.value_at((7, 7)).is_nil());
    }

    #[test]
    fn splitter_carries_bits_between_bundles() {
        let mut circuit = Circuit::new();
        circuit.add_splitter(Splitter::from_groups(
            Point::new(0, 0),
            &[(Point::new(10, 0), 1), (Point::new(10, 10), 1)],
        ));
        let mut state = SimState::new();
        state.drive((10, 0), A, Value::from_bool(true));
        state.drive((10, 10), B, Value::from_bool(false));
        propagate(&circuit, &mut state, [Point::new(10, 0), Point::new(10, 10)]).unwrap();
        assert_eq!(state.value_at((0, 0)), Value::from_u64(0b01, 2));
    }

    #[test]
    fn label_net_carries_bit() {
        let mut circuit = Circuit::new();
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(0, 0), 1, "N7", Direction::Output));
        circuit.add_bit_tunnel(BitTunnel::new(Point::new(90, 0), 1, "N7", Direction::Input));
        let mut state = SimState::new();
        state.drive((0, 0), A, Value::from_bool(true));
        propagate(&circuit, &mut state, [Point::new(0, 0)]).unwrap();
        assert_eq!(state.value_at((90, 0)), Value::from_bool(true));
    }

    #[test]
    fn stale_cache_triggers_full_resolve() {
        let mut circuit = wired(1);
        let mut state = SimState::new();
        state.drive((0, 0), A, Value::from_bool(true));
        propagate(&circuit, &mut state, [Point::new(0, 0)]).unwrap();
        let first = state.thread_cache_tag();

        circuit.add_wire((20, 0), (30, 0));
        // Nothing changed on the driver side, yet the new point resolves.
        propagate(&circuit, &mut state, NONE).unwrap();
        assert_ne!(state.thread_cache_tag(), first);
        assert_eq!(state.value_at((30, 0)), Value::from_bool(true));
    }

    #[test]
    fn removed_wire_point_is_cleared_on_rebuild() {
        let mut circuit = wired(1);
        let extra = circuit.add_wire((20, 0), (30, 0));
        let mut state = SimState::new();
        state.drive((0, 0), A, Value::from_bool(true));
        propagate_all(&circuit, &mut state).unwrap();
        assert_eq!(state.value_at((30, 0)), Value::from_bool(true));
        circuit.remove_wire(extra).unwrap();
        propagate(&circuit, &mut state, NONE).unwrap();
        assert!(state.value_at((30, 0)).is_nil());
    }

    #[test]
    fn fatal_build_surfaces_as_error() {
        let mut circuit = Circuit::new();
        circuit.add_splitter(Splitter::new(
            vec![SplitterEnd {
                location: Point::new(0, 0),
                width: 1,
            }],
            vec![2],
            vec![0],
        ));
        let mut state = SimState::new();
        let err = propagate(&circuit, &mut state, NONE).unwrap_err();
        assert!(matches!(
            err,
            EngineError::FatalBuild(BuildError::SplitterIndex { .. })
        ));
    }
}
