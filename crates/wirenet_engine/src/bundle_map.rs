//! Immutable snapshots of the bundle/thread graph for one topology version.
//!
//! A [`BundleMap`] is produced by the [`build`](crate::build) pipeline and
//! never mutated afterwards. Bundles and threads reference each other only
//! through [`BundleId`]/[`ThreadId`] indices into the snapshot's own arenas,
//! so a published snapshot can be shared between threads behind an `Arc`
//! without any locking.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use wirenet_common::{ContentHash, InternalError, Logic, WirenetResult};

use crate::arena::Arena;
use crate::circuit::TopologyVersion;
use crate::diagnostics::WidthIncompatibility;
use crate::error::BuildError;
use crate::ids::{BundleId, SplitterId, ThreadId};
use crate::point::Point;

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one built snapshot.
///
/// Simulation states tag their cached thread values with the `MapId` they
/// were computed against; a mismatch means the topology changed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MapId(u64);

impl MapId {
    fn fresh() -> Self {
        Self(NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Why a snapshot was published in a degraded state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DegradedReason {
    /// One or more bundles have conflicting widths and resolve to NIL.
    WidthConflicts {
        /// Number of invalid bundles.
        count: usize,
    },
    /// Every build attempt failed an internal consistency check; the
    /// snapshot is empty.
    RetriesExhausted {
        /// How many attempts were made.
        attempts: u32,
        /// The error from the final attempt.
        last_error: InternalError,
    },
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::WidthConflicts { count } => {
                write!(f, "{count} bundle(s) with incompatible widths")
            }
            DegradedReason::RetriesExhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {attempts} attempt(s): {last_error}"),
        }
    }
}

/// The result of building a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Every bundle resolved cleanly.
    Ready,
    /// The snapshot is usable but parts of it resolve to NIL.
    Degraded(DegradedReason),
    /// The topology cannot be built; propagation reports this error.
    Fatal(BuildError),
}

/// One `(bundle, bit offset)` position carried by a thread.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ThreadMember {
    /// The bundle the thread passes through.
    pub bundle: BundleId,
    /// The thread's bit position within that bundle.
    pub offset: u32,
}

/// One logical bit-line, possibly spanning several bundles through splitters
/// or label nets.
#[derive(Clone, Debug, Default)]
pub struct Thread {
    pub(crate) members: Vec<ThreadMember>,
}

impl Thread {
    /// Every bundle position this thread occupies.
    pub fn members(&self) -> &[ThreadMember] {
        &self.members
    }
}

/// A maximal set of points carrying one logical multi-bit value.
#[derive(Clone, Debug)]
pub struct Bundle {
    pub(crate) points: Vec<Point>,
    pub(crate) width: Option<u32>,
    pub(crate) valid: bool,
    pub(crate) pull: Option<Logic>,
    pub(crate) threads: Option<Vec<ThreadId>>,
    pub(crate) incompatibility: Option<usize>,
}

impl Bundle {
    /// Member points, sorted. Empty for synthetic label and constant nets.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns `true` if `point` belongs to this bundle.
    pub fn contains(&self, point: Point) -> bool {
        self.points.binary_search(&point).is_ok()
    }

    /// The resolved bit width, or `None` if unknown or conflicting.
    pub fn width(&self) -> Option<u32> {
        self.width
    }

    /// `false` if contributors declared conflicting widths.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Weak value applied to bits no driver defines.
    pub fn pull(&self) -> Option<Logic> {
        self.pull
    }

    /// One thread per bit, present only for valid bundles of known width.
    pub fn threads(&self) -> Option<&[ThreadId]> {
        self.threads.as_deref()
    }

    /// Index into [`BundleMap::incompatibilities`] for invalid bundles.
    pub fn incompatibility(&self) -> Option<usize> {
        self.incompatibility
    }
}

/// A frozen snapshot of every bundle and thread for one topology version.
#[derive(Debug)]
pub struct BundleMap {
    id: MapId,
    version: TopologyVersion,
    point_to_bundle: HashMap<Point, BundleId>,
    bundles: Arena<BundleId, Bundle>,
    threads: Arena<ThreadId, Thread>,
    splitter_ends: BTreeMap<SplitterId, Vec<BundleId>>,
    incompatibilities: Vec<WidthIncompatibility>,
    outcome: BuildOutcome,
}

impl BundleMap {
    pub(crate) fn from_parts(
        version: TopologyVersion,
        point_to_bundle: HashMap<Point, BundleId>,
        bundles: Arena<BundleId, Bundle>,
        threads: Arena<ThreadId, Thread>,
        splitter_ends: BTreeMap<SplitterId, Vec<BundleId>>,
        incompatibilities: Vec<WidthIncompatibility>,
    ) -> Self {
        let outcome = if incompatibilities.is_empty() {
            BuildOutcome::Ready
        } else {
            BuildOutcome::Degraded(DegradedReason::WidthConflicts {
                count: incompatibilities.len(),
            })
        };
        Self {
            id: MapId::fresh(),
            version,
            point_to_bundle,
            bundles,
            threads,
            splitter_ends,
            incompatibilities,
            outcome,
        }
    }

    /// An empty snapshot carrying only an outcome, published when the build
    /// could not produce anything usable.
    pub(crate) fn empty(version: TopologyVersion, outcome: BuildOutcome) -> Self {
        Self {
            id: MapId::fresh(),
            version,
            point_to_bundle: HashMap::new(),
            bundles: Arena::new(),
            threads: Arena::new(),
            splitter_ends: BTreeMap::new(),
            incompatibilities: Vec::new(),
            outcome,
        }
    }

    /// The unique identity of this snapshot.
    pub fn id(&self) -> MapId {
        self.id
    }

    /// The topology version this snapshot was built for.
    pub fn version(&self) -> TopologyVersion {
        self.version
    }

    /// How the build went.
    pub fn outcome(&self) -> &BuildOutcome {
        &self.outcome
    }

    /// `true` only for a clean build with no width conflicts.
    pub fn is_valid(&self) -> bool {
        self.outcome == BuildOutcome::Ready
    }

    /// The bundle containing `point`, if the point takes part in any wire,
    /// tunnel, splitter, pull resistor, or bit-labeled tunnel.
    pub fn bundle_at(&self, point: Point) -> Option<BundleId> {
        self.point_to_bundle.get(&point).copied()
    }

    /// The resolved width at `point`, or `None` if unknown or conflicting.
    pub fn width_at(&self, point: Point) -> Option<u32> {
        self.bundle_at(point).and_then(|id| self.bundles[id].width)
    }

    /// Returns the bundle with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID does not belong to this snapshot.
    pub fn bundle(&self, id: BundleId) -> &Bundle {
        &self.bundles[id]
    }

    /// Iterates over all bundles, including synthetic label and constant nets.
    pub fn bundles(&self) -> impl Iterator<Item = (BundleId, &Bundle)> {
        self.bundles.iter()
    }

    /// Number of bundles in the snapshot.
    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    /// Returns the thread with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID does not belong to this snapshot.
    pub fn thread(&self, id: ThreadId) -> &Thread {
        &self.threads[id]
    }

    /// Number of distinct threads in the snapshot.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Every point that belongs to some bundle.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.point_to_bundle.keys().copied()
    }

    /// The bundle at each end of a splitter, combined end first.
    pub fn splitter_end_bundles(&self, splitter: SplitterId) -> Option<&[BundleId]> {
        self.splitter_ends.get(&splitter).map(Vec::as_slice)
    }

    /// One diagnostic per invalid bundle.
    pub fn incompatibilities(&self) -> &[WidthIncompatibility] {
        &self.incompatibilities
    }

    /// A structural hash of the point partition.
    ///
    /// Covers each bundle's member points, width, and validity. Two builds
    /// of the same topology produce equal fingerprints even though their IDs
    /// differ. Synthetic bundles without points are not included.
    pub fn fingerprint(&self) -> ContentHash {
        let mut bundles: Vec<&Bundle> = self
            .bundles
            .values()
            .filter(|b| !b.points.is_empty())
            .collect();
        bundles.sort_by_key(|b| b.points[0]);
        let mut bytes = Vec::new();
        for bundle in bundles {
            bytes.extend_from_slice(&(bundle.points.len() as u32).to_le_bytes());
            for point in &bundle.points {
                bytes.extend_from_slice(&point.to_le_bytes());
            }
            bytes.extend_from_slice(&bundle.width.unwrap_or(0).to_le_bytes());
            bytes.push(u8::from(bundle.valid));
        }
        ContentHash::from_bytes(&bytes)
    }

    /// Checks the cross-references between points, bundles, and threads.
    pub(crate) fn verify(&self) -> WirenetResult<()> {
        for (&point, &id) in &self.point_to_bundle {
            let bundle = self
                .bundles
                .try_get(id)
                .ok_or_else(|| InternalError::new(format!("{point} maps to missing {id}")))?;
            if !bundle.contains(point) {
                return Err(InternalError::new(format!(
                    "{point} maps to {id} which does not contain it"
                )));
            }
        }
        for (id, bundle) in self.bundles.iter() {
            match (&bundle.threads, bundle.width, bundle.valid) {
                (None, _, _) => {}
                (Some(threads), Some(width), true) if threads.len() == width as usize => {
                    for (offset, &thread) in threads.iter().enumerate() {
                        let member = ThreadMember {
                            bundle: id,
                            offset: offset as u32,
                        };
                        let registered = self
                            .threads
                            .try_get(thread)
                            .is_some_and(|t| t.members.contains(&member));
                        if !registered {
                            return Err(InternalError::new(format!(
                                "{id} bit {offset} is not registered on {thread}"
                            )));
                        }
                    }
                }
                (Some(threads), width, valid) => {
                    return Err(InternalError::new(format!(
                        "{id} has {} threads but width {width:?} (valid: {valid})",
                        threads.len()
                    )));
                }
            }
        }
        Ok(())
    }
}
