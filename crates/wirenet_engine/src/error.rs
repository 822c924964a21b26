//! Error types for bundle construction, propagation, and configuration.
//!
//! Width conflicts are not errors: they are recorded as
//! [`WidthIncompatibility`](crate::diagnostics::WidthIncompatibility)
//! diagnostics on the snapshot. The variants here cover malformed splitter
//! data, broken engine invariants, edits naming removed elements, and bad
//! configuration files.

use wirenet_common::InternalError;

use crate::ids::SplitterId;

/// Errors raised by a single bundle build attempt.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A splitter's `bit_end`/`bit_thread` tables point outside the ends or
    /// threads they describe. This is a modeling bug in the splitter, not a
    /// user wiring mistake, and is never retried.
    #[error("splitter {splitter} bit {bit}: {reason}")]
    SplitterIndex {
        /// The splitter with the malformed tables.
        splitter: SplitterId,
        /// The combined-end bit whose entry is out of range.
        bit: u32,
        /// Which index was out of range and against what bound.
        reason: String,
    },

    /// An engine invariant did not hold after the build. Retried.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl BuildError {
    /// Returns `true` if retrying the build cannot succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BuildError::SplitterIndex { .. })
    }
}

/// Errors surfaced to callers of the engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The current topology cannot be built into a bundle map at all.
    #[error("bundle map build failed: {0}")]
    FatalBuild(BuildError),

    /// An edit referred to a circuit element that does not exist.
    #[error("no {kind} with ID {id} in circuit")]
    UnknownElement {
        /// The element kind (e.g. "wire", "splitter").
        kind: &'static str,
        /// The raw ID that was not found.
        id: u32,
    },
}

/// Errors that can occur when loading or validating an engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
