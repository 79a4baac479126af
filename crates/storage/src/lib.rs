//! # Storage
//!
//! Reference collaborator backends behind the `contracts` traits.
//!
//! The production system talks to an object store, a relational metadata
//! index and a neuroscience toolkit; this crate ships the local stand-ins:
//! - `MemoryChunkStore` / `MemoryMetadataStore` - in-process, for tests and
//!   mock runs
//! - `FsChunkStore` / `JsonMetadataStore` - filesystem-backed, for running
//!   the pipeline end-to-end on a laptop
//! - `FsDatasetWriter` / `SummaryAnalyzer` - plain-file stand-ins for the
//!   external toolkit's format writing and live analysis

mod analyzer;
mod fs;
mod memory;
mod writer;

pub use analyzer::SummaryAnalyzer;
pub use fs::{FsChunkStore, JsonMetadataStore};
pub use memory::{MemoryChunkStore, MemoryMetadataStore};
pub use writer::{FsDatasetWriter, MemoryDatasetWriter};
