//! The heap event log
//!
//! [`HeapHistory`] records malloc/free/realloc events into an append-only
//! block log, tracks which blocks are live, and owns the viewport and the
//! derived lookup caches:
//! - [`block`]: [`HeapBlock`] and [`HeapConflict`]
//! - [`annotation`]: tick/address markers and their [`Rgb`] colors
//! - [`recorder`]: the recording API and accessors
//! - [`queries`]: point lookups, event search, window culling, active regions
//! - [`vertices`]: geometry for the rendering layers
//! - [`loader`]: JSON event streams
//! - [`errors`]: [`LoadError`] and [`RecordError`]
//!
//! # Block lifecycle
//!
//! ```text
//! malloc ──► live ──free──► freed (terminal)
//!              │
//!              └─ malloc of the same (address, heap) ──► conflict, log unchanged
//! ```
//!
//! A free of an address that is not live is also recorded as a conflict.
//! Conflicts are data, never errors.

pub mod annotation;
pub mod block;
pub mod errors;
pub mod loader;
pub mod queries;
pub mod recorder;
pub mod vertices;

pub use annotation::{Annotation, Rgb};
pub use block::{ConflictKind, HeapBlock, HeapConflict, Tag};
pub use errors::{LoadError, RecordError};
pub use loader::LoadSummary;
pub use queries::AddressIndex;
pub use recorder::HeapHistory;
