//! Per-simulation driven values, resolved wire values, and the thread cache.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use wirenet_common::{Logic, Value};

use crate::bundle_map::MapId;
use crate::ids::{DriverId, ThreadId};
use crate::point::Point;

/// Resolved thread values, valid only for the snapshot they were computed
/// against.
#[derive(Debug, Clone)]
struct ThreadCache {
    map: MapId,
    values: Vec<Logic>,
}

/// The value a driver is currently putting onto a point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    /// The driving component.
    pub driver: DriverId,
    /// The driven value.
    pub value: Value,
}

/// The mutable signal state of one simulation.
///
/// Components register what they drive with [`drive`](Self::drive) and
/// [`release`](Self::release); [`propagate`](crate::propagate::propagate)
/// turns those contributions into resolved values readable with
/// [`value_at`](Self::value_at). A `SimState` is owned by one simulation and
/// is never shared, so it needs no locking.
#[derive(Debug, Clone, Default)]
pub struct SimState {
    drivers: HashMap<Point, BTreeMap<DriverId, Value>>,
    wire_values: HashMap<Point, Value>,
    thread_cache: Option<ThreadCache>,
    changed: BTreeSet<Point>,
}

impl SimState {
    /// Creates a state with no drivers and no resolved values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value `driver` puts onto `point`, replacing any earlier one.
    ///
    /// Driving NIL is the same as releasing the point.
    pub fn drive(&mut self, point: impl Into<Point>, driver: DriverId, value: Value) {
        let point = point.into();
        if value.is_nil() {
            self.release(point, driver);
            return;
        }
        self.drivers.entry(point).or_default().insert(driver, value);
    }

    /// Stops `driver` from driving `point`, returning what it drove.
    pub fn release(&mut self, point: impl Into<Point>, driver: DriverId) -> Option<Value> {
        let point = point.into();
        let drives = self.drivers.get_mut(&point)?;
        let old = drives.remove(&driver);
        if drives.is_empty() {
            self.drivers.remove(&point);
        }
        old
    }

    /// Every drive currently on `point`, in driver order.
    pub fn drives_at(&self, point: Point) -> impl Iterator<Item = Drive> + '_ {
        self.drivers.get(&point).into_iter().flat_map(|drives| {
            drives.iter().map(|(&driver, value)| Drive {
                driver,
                value: value.clone(),
            })
        })
    }

    pub(crate) fn driven_values_at(&self, point: Point) -> impl Iterator<Item = &Value> {
        self.drivers.get(&point).into_iter().flat_map(|d| d.values())
    }

    /// All drivers' values at `point` combined, or NIL if nothing drives it.
    pub fn driven_at(&self, point: impl Into<Point>) -> Value {
        self.driven_values_at(point.into())
            .fold(Value::nil(), |acc, v| acc.combine(v))
    }

    /// Points with at least one active driver.
    pub fn driven_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.drivers.keys().copied()
    }

    /// The resolved value at `point` after the last propagation.
    ///
    /// NIL means the point carries no value: it is undriven and unwired, or
    /// its bundle has an unknown or conflicting width.
    pub fn value_at(&self, point: impl Into<Point>) -> Value {
        self.wire_values
            .get(&point.into())
            .cloned()
            .unwrap_or_else(Value::nil)
    }

    /// Drains the points whose resolved value changed since the last call,
    /// in point order.
    pub fn take_changed(&mut self) -> Vec<Point> {
        std::mem::take(&mut self.changed).into_iter().collect()
    }

    /// The cached value of `thread`, if the cache has one.
    pub fn cached_thread_value(&self, thread: ThreadId) -> Option<Logic> {
        let cache = self.thread_cache.as_ref()?;
        cache.values.get(thread.as_raw() as usize).copied()
    }

    /// The snapshot the thread cache was computed against.
    pub fn thread_cache_tag(&self) -> Option<MapId> {
        self.thread_cache.as_ref().map(|c| c.map)
    }

    pub(crate) fn reset_thread_cache(&mut self, map: MapId, threads: usize) {
        self.thread_cache = Some(ThreadCache {
            map,
            values: vec![Logic::Unknown; threads],
        });
    }

    pub(crate) fn clear_thread_cache(&mut self) {
        self.thread_cache = None;
    }

    pub(crate) fn store_thread_value(&mut self, thread: ThreadId, value: Logic) {
        if let Some(slot) = self
            .thread_cache
            .as_mut()
            .and_then(|c| c.values.get_mut(thread.as_raw() as usize))
        {
            *slot = value;
        }
    }

    pub(crate) fn wire_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.wire_values.keys().copied()
    }

    /// Writes a resolved value and records the point if it changed.
    pub(crate) fn set_wire_value(&mut self, point: Point, value: Value) {
        let old = if value.is_nil() {
            self.wire_values.remove(&point)
        } else {
            self.wire_values.insert(point, value.clone())
        };
        if old.unwrap_or_else(Value::nil) != value {
            self.changed.insert(point);
        }
    }
}
