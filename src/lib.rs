// SPDX-License-Identifier: MPL-2.0
//! `anime_upscaler` batch-upscales manga, manhwa and anime images with
//! Real-ESRGAN models running on ONNX Runtime.
//!
//! Every supported image of an input directory is written, upscaled, to an
//! `upscaled` subdirectory. Runs are idempotent: outputs that already exist
//! are skipped. Model weights are downloaded once into a local cache.
//!
//! The crate is layered:
//! - [`domain`]: value types and pure rules, free of I/O
//! - [`application`]: enumeration, batch execution and model provisioning,
//!   written against the [`application::port::ImageEnhancer`] port
//! - [`infrastructure`]: the ONNX Runtime adapter
//! - [`media`]: image I/O, tiling, downloads and raw inference
//! - [`frontend`]: running the binary as a child process for GUIs

#![doc(html_root_url = "https://docs.rs/anime_upscaler/0.1.0")]

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod frontend;
pub mod infrastructure;
pub mod media;
pub mod paths;
