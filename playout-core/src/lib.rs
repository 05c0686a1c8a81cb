//! # Playout Core
//!
//! The scheduling engine that turns a program schedule and a media catalog
//! into a deterministic, resumable playout timeline.
//!
//! ## Architecture
//!
//! - [`enumerators`]: ordering strategies over a collection, driven by a
//!   persisted `{index, seed}` cursor
//! - [`grouping`]: multi-part episode detection
//! - [`expressions`]: the count and filler expression languages
//! - [`scheduling`]: the per-rule schedulers and the shared filler logic
//! - [`selector`]: date-based alternate schedule selection
//! - [`builder`]: day-by-day orchestration, anchoring and resume
//!
//! Everything is synchronous. A build only reads the catalog and mutates the
//! playout it was handed, so separate playouts can be built in parallel.
#![allow(missing_docs)]

pub mod builder;
pub mod catalog;
pub mod enumerators;
pub mod error;
pub mod expressions;
pub mod grouping;
pub mod scheduling;
pub mod selector;

pub use builder::{BuildOutcome, BuilderSettings, PlayoutBuilder};
pub use catalog::{InMemoryCatalog, MediaCatalog};
pub use enumerators::{EnumeratorMap, MediaCollectionEnumerator};
pub use error::{Result, SchedulingError};
pub use scheduling::PlayoutBuilderState;

/// Re-export of the data model so downstream crates need a single import.
pub use playout_model as model;
