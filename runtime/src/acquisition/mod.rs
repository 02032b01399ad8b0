// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Document acquisition.
//!
//! The orchestrator tries each access strategy in turn: a plain HTTP probe
//! for a downloadable original, rendering the registry URL, rendering it in
//! the other window mode, and finally the portal's search form.

pub mod http_client;
pub mod orchestrator;
pub mod portal;
pub mod probe;
pub mod search;

pub use http_client::HttpClient;
pub use orchestrator::{
    Acquisition, AcquisitionOrchestrator, ExtractionResult, Strategy, StrategyFailure,
};
pub use portal::Portal;
