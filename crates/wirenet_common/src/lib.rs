//! Shared foundational types used across the wirenet workspace.
//!
//! This crate provides the four-valued [`Logic`] bit, the packed multi-bit
//! [`Value`] carried by wire bundles, interned net labels, content hashing for
//! snapshot fingerprints, and common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod logic;
pub mod result;
pub mod value;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use result::{InternalError, WirenetResult};
pub use value::Value;
