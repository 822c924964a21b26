//! The topology builders that turn a [`Circuit`] into a [`BundleMap`].
//!
//! A build runs in two stages. The [`Builder`] stage unions points into
//! bundles through wires, tunnel labels, pull resistors, and the anchors of
//! bit-labeled tunnels and splitters, then flattens every union-find set into
//! one compact bundle record. The [`Layout`] stage resolves widths, creates
//! one thread per bit, unions threads across splitters and label nets, and
//! freezes the result into an immutable snapshot.
//!
//! [`build_with_retry`] wraps one build function with the bounded retry and
//! outcome classification used by [`Circuit::bundle_map`].

mod connect;
mod label_nets;
mod splitters;
mod union_find;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, error, warn};
use wirenet_common::{InternalError, Logic};

use crate::arena::Arena;
use crate::bundle_map::{
    BuildOutcome, Bundle, BundleMap, DegradedReason, Thread, ThreadMember,
};
use crate::circuit::{Circuit, TopologyVersion};
use crate::diagnostics::WidthIncompatibility;
use crate::error::BuildError;
use crate::ids::{BundleId, SplitterId, ThreadId};
use crate::point::Point;

use union_find::UnionFind;

/// Builds the bundle map for the circuit's current topology.
///
/// Width conflicts do not fail the build; they produce a degraded snapshot.
/// Malformed splitter tables fail with [`BuildError::SplitterIndex`], and a
/// snapshot that fails its own consistency check fails with
/// [`BuildError::Internal`].
pub(crate) fn build_bundle_map(circuit: &Circuit) -> Result<BundleMap, BuildError> {
    let mut builder = Builder::new(circuit);
    builder.connect_wires();
    builder.connect_tunnels();
    builder.connect_pull_resistors();
    builder.anchor_bit_tunnels();
    builder.anchor_splitters();
    builder.declare_port_widths();

    let mut layout = builder.flatten();
    layout.resolve_widths();
    layout.record_splitter_ends()?;
    layout.create_threads();
    layout.unify_splitter_threads()?;
    layout.connect_bit_labeled_tunnels();

    let map = layout.freeze();
    map.verify()?;
    Ok(map)
}

/// Runs `attempt` until it succeeds, fails fatally, or `max_attempts` runs
/// have failed, and always returns a snapshot to publish.
///
/// A fatal error yields an empty snapshot with [`BuildOutcome::Fatal`].
/// Exhausting the attempts yields an empty snapshot with
/// [`DegradedReason::RetriesExhausted`].
pub(crate) fn build_with_retry(
    version: TopologyVersion,
    max_attempts: u32,
    mut attempt: impl FnMut(u32) -> Result<BundleMap, BuildError>,
) -> BundleMap {
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;
    for n in 1..=max_attempts {
        debug!("building bundle map for {version} (attempt {n}/{max_attempts})");
        match attempt(n) {
            Ok(map) => {
                debug!(
                    "bundle map for {version} ready: {} bundles, {} threads, {} width conflicts",
                    map.bundle_count(),
                    map.thread_count(),
                    map.incompatibilities().len()
                );
                return map;
            }
            Err(BuildError::Internal(err)) => {
                warn!("bundle map build for {version} failed on attempt {n}/{max_attempts}: {err}");
                last_error = Some(err);
            }
            Err(fatal) => {
                error!("bundle map build for {version} failed fatally: {fatal}");
                return BundleMap::empty(version, BuildOutcome::Fatal(fatal));
            }
        }
    }
    let last_error =
        last_error.unwrap_or_else(|| InternalError::new("no build attempt was made"));
    warn!("giving up on bundle map for {version} after {max_attempts} attempts; publishing an empty snapshot");
    BundleMap::empty(
        version,
        BuildOutcome::Degraded(DegradedReason::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        }),
    )
}

/// Per-bundle state while points are still being unioned.
#[derive(Debug, Default)]
struct WorkBundle {
    points: Vec<Point>,
    pull: Option<Logic>,
}

/// First stage: union points into bundles.
struct Builder<'c> {
    circuit: &'c Circuit,
    sets: UnionFind<BundleId>,
    work: Vec<WorkBundle>,
    point_index: HashMap<Point, BundleId>,
    declarations: Vec<(Point, u32)>,
}

impl<'c> Builder<'c> {
    fn new(circuit: &'c Circuit) -> Self {
        Self {
            circuit,
            sets: UnionFind::new(),
            work: Vec::new(),
            point_index: HashMap::new(),
            declarations: Vec::new(),
        }
    }

    /// The bundle initially created for `point`, created on first use.
    fn bundle_for(&mut self, point: Point) -> BundleId {
        if let Some(&id) = self.point_index.get(&point) {
            return id;
        }
        let id = self.sets.make_set();
        self.work.push(WorkBundle {
            points: vec![point],
            pull: None,
        });
        self.point_index.insert(point, id);
        id
    }

    /// Records a width declared at `point`. Zero means "no opinion".
    fn declare_width(&mut self, point: Point, width: u32) {
        if width > 0 {
            self.declarations.push((point, width));
        }
    }

    /// Collapses every union-find set into one bundle record with fresh,
    /// dense IDs and merges member points and pulls into it.
    fn flatten(self) -> Layout<'c> {
        let Builder {
            circuit,
            mut sets,
            work,
            declarations,
            ..
        } = self;

        let mut bundles: Arena<BundleId, Bundle> = Arena::new();
        let mut compact: HashMap<BundleId, BundleId> = HashMap::new();
        for (index, work) in work.into_iter().enumerate() {
            let root = sets.find(BundleId::from_raw(index as u32));
            let target = *compact
                .entry(root)
                .or_insert_with(|| bundles.alloc(empty_bundle()));
            let bundle = &mut bundles[target];
            bundle.points.extend(work.points);
            if let Some(pull) = work.pull {
                merge_pull(&mut bundle.pull, pull);
            }
        }

        let mut point_to_bundle = HashMap::new();
        for (id, bundle) in bundles.iter_mut() {
            bundle.points.sort_unstable();
            bundle.points.dedup();
            for &point in &bundle.points {
                point_to_bundle.insert(point, id);
            }
        }

        Layout {
            circuit,
            point_to_bundle,
            bundles,
            declarations,
            threads: UnionFind::new(),
            splitter_ends: BTreeMap::new(),
            incompatibilities: Vec::new(),
        }
    }
}

/// Second stage: widths, threads, and thread unions over fixed bundles.
struct Layout<'c> {
    circuit: &'c Circuit,
    point_to_bundle: HashMap<Point, BundleId>,
    bundles: Arena<BundleId, Bundle>,
    declarations: Vec<(Point, u32)>,
    threads: UnionFind<ThreadId>,
    splitter_ends: BTreeMap<SplitterId, Vec<BundleId>>,
    incompatibilities: Vec<WidthIncompatibility>,
}

impl Layout<'_> {
    /// Resolves each bundle's width from the declarations that reached it.
    ///
    /// One distinct width sets the bundle's width; none leaves it unknown;
    /// more than one marks the bundle invalid and records a diagnostic.
    fn resolve_widths(&mut self) {
        let mut per_bundle: BTreeMap<BundleId, Vec<(Point, u32)>> = BTreeMap::new();
        for &(point, width) in &self.declarations {
            if let Some(&id) = self.point_to_bundle.get(&point) {
                per_bundle.entry(id).or_default().push((point, width));
            }
        }
        for (id, declared) in per_bundle {
            let widths: BTreeSet<u32> = declared.iter().map(|&(_, w)| w).collect();
            let bundle = &mut self.bundles[id];
            if widths.len() == 1 {
                bundle.width = widths.first().copied();
            } else {
                bundle.valid = false;
                bundle.width = None;
                bundle.incompatibility = Some(self.incompatibilities.len());
                self.incompatibilities
                    .push(WidthIncompatibility::new(declared));
            }
        }
    }

    /// Allocates one thread per bit of every valid bundle of known width.
    fn create_threads(&mut self) {
        for (_, bundle) in self.bundles.iter_mut() {
            if let (true, Some(width)) = (bundle.valid, bundle.width) {
                let threads = (0..width).map(|_| self.threads.make_set()).collect();
                bundle.threads = Some(threads);
            }
        }
    }

    /// Adds a point-less bundle of width 1 with its own thread, used for
    /// label nets and constant nets.
    fn alloc_synthetic(&mut self, pull: Option<Logic>) -> ThreadId {
        let thread = self.threads.make_set();
        let mut bundle = empty_bundle();
        bundle.width = Some(1);
        bundle.pull = pull;
        bundle.threads = Some(vec![thread]);
        self.bundles.alloc(bundle);
        thread
    }

    /// Replaces every thread slot with its set representative, renumbers the
    /// representatives densely, and registers each bundle bit on its thread.
    fn freeze(mut self) -> BundleMap {
        let mut threads: Arena<ThreadId, Thread> = Arena::new();
        let mut compact: HashMap<ThreadId, ThreadId> = HashMap::new();
        for (bundle_id, bundle) in self.bundles.iter_mut() {
            let Some(slots) = bundle.threads.as_mut() else {
                continue;
            };
            for (offset, slot) in slots.iter_mut().enumerate() {
                let root = self.threads.find(*slot);
                let id = *compact
                    .entry(root)
                    .or_insert_with(|| threads.alloc(Thread::default()));
                threads[id].members.push(ThreadMember {
                    bundle: bundle_id,
                    offset: offset as u32,
                });
                *slot = id;
            }
        }
        BundleMap::from_parts(
            self.circuit.version(),
            self.point_to_bundle,
            self.bundles,
            threads,
            self.splitter_ends,
            self.incompatibilities,
        )
    }
}

fn empty_bundle() -> Bundle {
    Bundle {
        points: Vec::new(),
        width: None,
        valid: true,
        pull: None,
        threads: None,
        incompatibility: None,
    }
}

fn merge_pull(slot: &mut Option<Logic>, pull: Logic) {
    *slot = Some(match *slot {
        Some(existing) => existing.combine(pull),
        None => pull,
    });
}
