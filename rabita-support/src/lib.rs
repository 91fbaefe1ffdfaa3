//! # Rabita Support
//!
//! Shared utilities for the Rabita DI engine.
//!
//! This crate provides:
//! - Rendering of resolution chains for cycle diagnostics
//! - Type-name shortening and "did you mean?" suggestions for lookup failures

pub mod rendering;
