//! Single-flight cache of the current [`BundleMap`] snapshot.
//!
//! [`BundleMapCache`] holds at most one pending build, tagged with the
//! [`TopologyVersion`] it was started for. The first reader for a version
//! becomes the builder; every other reader for the same version blocks on
//! the same `OnceLock` until the snapshot is published. Readers never see a
//! half-built snapshot, and a snapshot handed out stays valid after the cache
//! moves on to a newer version.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use log::debug;

use crate::bundle_map::BundleMap;
use crate::circuit::TopologyVersion;

/// One snapshot, possibly still being built.
#[derive(Debug)]
struct PendingBuild {
    version: TopologyVersion,
    map: OnceLock<Arc<BundleMap>>,
}

/// Lazily built, shared bundle map for one circuit.
#[derive(Debug, Default)]
pub struct BundleMapCache {
    /// The only mutable state shared between readers.
    slot: Mutex<Option<Arc<PendingBuild>>>,
    builds_started: AtomicU64,
}

// Compile-time assertion: BundleMapCache must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<BundleMapCache>();
};

impl BundleMapCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot for `version`, running `build` if no reader has
    /// started one yet.
    ///
    /// Blocks while another thread builds the same version. If `build`
    /// panics, the panic reaches its caller and the next waiter takes over
    /// the build.
    pub fn get_or_build(
        &self,
        version: TopologyVersion,
        build: impl FnOnce() -> BundleMap,
    ) -> Arc<BundleMap> {
        let pending = {
            let mut slot = self.slot.lock().unwrap();
            match slot.as_ref() {
                Some(pending) if pending.version == version => Arc::clone(pending),
                _ => {
                    let pending = Arc::new(PendingBuild {
                        version,
                        map: OnceLock::new(),
                    });
                    *slot = Some(Arc::clone(&pending));
                    pending
                }
            }
        };
        let map = pending.map.get_or_init(|| {
            self.builds_started.fetch_add(1, Ordering::Relaxed);
            Arc::new(build())
        });
        Arc::clone(map)
    }

    /// The published snapshot, if one is ready. Never blocks on a build.
    pub fn peek(&self) -> Option<Arc<BundleMap>> {
        let slot = self.slot.lock().unwrap();
        slot.as_ref()?.map.get().cloned()
    }

    /// Drops the cached reference so the next reader rebuilds.
    pub fn invalidate(&mut self) {
        let slot = self.slot.get_mut().unwrap();
        if let Some(pending) = slot.take() {
            debug!("invalidated bundle map cache for {}", pending.version);
        }
    }

    /// How many builds this cache has started over its lifetime.
    pub fn builds_started(&self) -> u64 {
        self.builds_started.load(Ordering::Relaxed)
    }
}
