// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core business logic with ZERO external dependencies.
//!
//! This module contains pure domain types, value objects, and business rules
//! for a batch upscaling run. It has no dependencies on external crates
//! (except `std`) so the rules can be tested without a model or a network.
//!
//! # Modules
//!
//! - [`device`]: Compute backends and the `auto` selection cascade
//!   ([`DevicePreference`](device::DevicePreference), [`Device`](device::Device))
//! - [`model`]: Model registry ([`ModelKind`](model::ModelKind),
//!   [`ModelArtifact`](model::ModelArtifact))
//! - [`run_config`]: Validated per-invocation settings
//!   ([`RunConfig`](run_config::RunConfig), [`ScaleFactor`](run_config::ScaleFactor))
//! - [`task`]: Per-file task lifecycle and the aggregate
//!   ([`RunSummary`](task::RunSummary))

pub mod device;
pub mod model;
pub mod run_config;
pub mod task;

pub use device::{Device, DevicePreference, DeviceProbe, UnknownDevice};
pub use model::{ModelArtifact, ModelKind, UnknownModel};
pub use run_config::{Precision, RunConfig, RunConfigError, ScaleFactor, TileConfig};
pub use task::{FailureKind, ImageTask, RunSummary, TaskFailure, TaskStatus};
