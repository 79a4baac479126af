//! # Export
//!
//! Async export-job orchestration: one worker task per submitted job walks a
//! dataset's sessions, rebuilds each recording from its stored chunks and
//! packages the job directory into a `.tar.zst` archive.
//!
//! Job state lives in an injected [`JobRegistry`]; terminal statuses stay
//! queryable until the caller prunes them.

mod error;
mod packaging;
mod registry;
mod service;
mod worker;

pub use error::ExportError;
pub use packaging::{cleanup_job_dir, package_job_dir};
pub use registry::JobRegistry;
pub use service::ExportService;
