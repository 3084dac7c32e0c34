//! Diff engine for dsync.
//!
//! Everything here is a pure function of its inputs: no store access, no
//! side effects, identical output for identical input.
//!
//! # Key Types
//!
//! - [`IdDiff`] -- upload / download / common partition of two id listings
//! - [`PropertyDiff`] / [`PropertyChange`] -- key-level diff of two property snapshots

pub mod id_diff;
pub mod property_diff;

pub use id_diff::{
    diff_ids, missing_from, remote_extras, remote_missing_from, select_documents, IdDiff,
};
pub use property_diff::{
    diff_properties, render_unified, strip_volatile, PropertyChange, PropertyDiff, VOLATILE_KEYS,
};
