// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Normas runtime library: acquisition and extraction engine for
//! script-rendered regulatory documents.
//!
//! This library crate exposes the engine modules for the binary and for
//! integration testing.

pub mod acquisition;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod progress;
pub mod record;
pub mod renderer;
pub mod store;
