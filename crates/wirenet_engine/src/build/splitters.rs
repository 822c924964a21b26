//! Splitter anchoring and thread unification across splitter ends.

use super::{Builder, Layout};
use crate::error::BuildError;
use crate::ids::{BundleId, SplitterId, ThreadId};
use wirenet_common::InternalError;

impl Builder<'_> {
    /// Ensures a bundle at every splitter end and declares the end's width.
    pub(super) fn anchor_splitters(&mut self) {
        let circuit = self.circuit;
        for (_, splitter) in circuit.splitters() {
            for end in splitter.ends() {
                self.bundle_for(end.location);
                self.declare_width(end.location, end.width);
            }
        }
    }
}

impl Layout<'_> {
    /// Records the flattened bundle at each end of every splitter.
    pub(super) fn record_splitter_ends(&mut self) -> Result<(), InternalError> {
        let circuit = self.circuit;
        for (id, splitter) in circuit.splitters() {
            let ends = splitter
                .ends()
                .iter()
                .map(|end| {
                    self.point_to_bundle.get(&end.location).copied().ok_or_else(|| {
                        InternalError::new(format!(
                            "splitter {id} end at {} has no bundle",
                            end.location
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            self.splitter_ends.insert(id, ends);
        }
        Ok(())
    }

    /// Unions each routed combined-end bit with the bit it maps to on its
    /// split end.
    ///
    /// Bits whose combined or split bundle is invalid or of unknown width are
    /// skipped. Table entries pointing outside the ends, or outside the
    /// threads of a resolved bundle, fail the build.
    pub(super) fn unify_splitter_threads(&mut self) -> Result<(), BuildError> {
        let circuit = self.circuit;
        for (id, splitter) in circuit.splitters() {
            let Some(ends) = self.splitter_ends.get(&id).cloned() else {
                continue;
            };
            for (bit, &end) in splitter.bit_end().iter().enumerate() {
                let bit = bit as u32;
                if end == 0 {
                    continue;
                }
                let Some(&target) = ends.get(end as usize) else {
                    return Err(corrupt(
                        id,
                        bit,
                        format!("end index {end} out of range for {} ends", ends.len()),
                    ));
                };
                let Some(combined) = ends.first().copied().and_then(|b| self.threads_of(b)) else {
                    continue;
                };
                let Some(&from) = combined.get(bit as usize) else {
                    return Err(corrupt(
                        id,
                        bit,
                        format!("bit out of range for combined width {}", combined.len()),
                    ));
                };
                let Some(split) = self.threads_of(target) else {
                    continue;
                };
                let Some(&index) = splitter.bit_thread().get(bit as usize) else {
                    return Err(corrupt(id, bit, "no bit_thread entry".to_string()));
                };
                let Some(&to) = split.get(index as usize) else {
                    return Err(corrupt(
                        id,
                        bit,
                        format!(
                            "thread index {index} out of range for width {}",
                            split.len()
                        ),
                    ));
                };
                self.threads.union(from, to);
            }
        }
        Ok(())
    }

    fn threads_of(&self, bundle: BundleId) -> Option<Vec<ThreadId>> {
        self.bundles[bundle].threads.clone()
    }
}

fn corrupt(splitter: SplitterId, bit: u32, reason: String) -> BuildError {
    BuildError::SplitterIndex {
        splitter,
        bit,
        reason,
    }
}
