// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! `normas filename`: print the artifact filename for a record.

use super::output::{self, OutputMode};
use crate::store::naming::{artifact_filename, sidecar_filename};
use anyhow::Result;
use serde_json::json;

pub fn run(doc_type: &str, number: &str, subject: &str, mode: OutputMode) -> Result<()> {
    let artifact = artifact_filename(doc_type, number, subject);
    if mode.is_json() {
        output::print_json(&json!({
            "artifact": artifact,
            "sidecar": sidecar_filename(&artifact),
        }));
    } else {
        println!("{artifact}");
    }
    Ok(())
}
