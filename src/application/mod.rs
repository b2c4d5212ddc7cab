// SPDX-License-Identifier: MPL-2.0
//! Application layer - Use cases and orchestration.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//! - [`provision`]: Model artifact cache and download
//! - [`enumerate`]: Discovery of input images
//! - [`batch`]: Sequential per-file execution with failure isolation
//! - [`pipeline`]: The complete discover-and-run use case
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The binary wires infrastructure into the use cases

pub mod batch;
pub mod enumerate;
pub mod pipeline;
pub mod port;
pub mod provision;

pub use batch::BatchRunner;
pub use enumerate::JobList;
pub use pipeline::run_batch;
pub use provision::{ArtifactProvisioner, ArtifactState};
