// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//!
//! # Available Ports
//!
//! - [`enhance`]: Super-resolution of a single image
//!
//! # Design Notes
//!
//! - Traits are `Send + Sync` for shareable adapters
//! - Methods return `Result` with port-specific error types
//! - No `async fn`; inference is synchronous and sequential

pub mod enhance;

// Re-export main types for convenience
pub use enhance::{EnhanceError, EnhancerCapabilities, ImageEnhancer};
