//! Bundle orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that sequences
//! building, signing and distribution for each build variant.
//!
//! # Overview
//!
//! The bundler:
//! 1. Reads configuration from [`crate::bundler::Settings`]
//! 2. Resolves which targets to produce
//! 3. Runs the store and direct-distribution branches per architecture
//! 4. Tears down session resources through the [`CleanupRegistry`]
//! 5. Returns every reported [`crate::bundler::Artifact`]
//!
//! # Module Organization
//!
//! - [`cleanup`] - Session teardown actions (ephemeral keychain deletion)
//! - [`orchestrator`] - Main [`Bundler`] struct and branch sequencing
//! - [`tool_detection`] - External tool availability checking

pub mod cleanup;
mod orchestrator;
pub mod tool_detection;

pub use cleanup::CleanupRegistry;
pub use orchestrator::{Bundler, Toolchain};
