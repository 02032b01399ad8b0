// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use super::output::{self, OutputMode};
use super::ConfigArgs;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use serde_json::json;
use std::path::Path;

/// Check the browser binary, the registry file and the output directory.
pub async fn run(args: &ConfigArgs, mode: OutputMode) -> Result<()> {
    let config = args.resolve();
    let chromium = find_chromium(config.chromium_path.as_deref());
    let registry_ok = config.registry_path.is_file();
    let output_ok = output_writable(&config.output_dir);
    let ready = chromium.is_some() && registry_ok;

    if mode.is_json() {
        output::print_json(&json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "registry": config.registry_path.display().to_string(),
            "registry_found": registry_ok,
            "output_dir": config.output_dir.display().to_string(),
            "output_writable": output_ok,
            "ready": ready,
        }));
        return Ok(());
    }

    let s = output::Styled::new();
    println!("Normas Doctor");
    println!("=============");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match &chromium {
        Some(path) => println!("{} Chromium found: {}", s.ok_sym(), path.display()),
        None => println!(
            "{} Chromium NOT found. Install Chrome/Chromium or set NORMAS_CHROMIUM_PATH.",
            s.fail_sym()
        ),
    }
    if registry_ok {
        println!("{} Registry: {}", s.ok_sym(), config.registry_path.display());
    } else {
        println!("{} Registry missing: {}", s.fail_sym(), config.registry_path.display());
    }
    if output_ok {
        println!("{} Output directory writable: {}", s.ok_sym(), config.output_dir.display());
    } else {
        println!(
            "{} Output directory not writable: {}",
            s.warn_sym(),
            config.output_dir.display()
        );
    }

    println!();
    println!("Status: {}", if ready { "READY" } else { "NOT READY" });
    Ok(())
}

/// Whether the directory exists (or can be created) and accepts a file.
fn output_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".normas-doctor");
    let ok = std::fs::write(&probe, b"").is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}
