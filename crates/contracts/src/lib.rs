//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Wall-clock instants are `chrono::DateTime<Utc>`
//! - Devices stamp samples with a 32-bit monotonic microsecond counter whose
//!   epoch is the device boot, unrelated to wall-clock time; absolute
//!   timestamps are reconstructed downstream from a reference instant

mod analysis;
mod config;
mod error;
mod job;
mod sample;
mod session;
mod store;
mod user_id;

pub use analysis::*;
pub use config::*;
pub use error::*;
pub use job::*;
pub use sample::*;
pub use session::*;
pub use store::*;
pub use user_id::UserId;
