// Copyright 2026 Normas Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use normas_runtime::cli::output::{self, OutputMode};
use normas_runtime::cli::{self, ConfigArgs};

#[derive(Parser)]
#[command(
    name = "normas",
    about = "Normas: acquire regulatory documents from the BCB portal as text",
    version,
    after_help = "Run 'normas <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire every document in the registry
    Run {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Retry the documents recorded in the failure ledger
    Replay {
        #[command(flatten)]
        config: ConfigArgs,
        /// Readiness poll budget for the replay (default: twice the normal budget)
        #[arg(long)]
        max_polls: Option<u32>,
    },
    /// Check environment and diagnose issues
    Doctor {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the artifact filename for a document
    Filename {
        /// Document type, e.g. "Resolução CMN"
        doc_type: String,
        /// Document number, e.g. "4.734"
        number: String,
        /// Subject line
        #[arg(default_value = "")]
        subject: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

fn init_tracing(debug: bool, json: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        format!("normas_runtime={level}")
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
    );
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mode = OutputMode::new(cli.json, cli.quiet);

    let debug = cli.verbose
        || matches!(
            &cli.command,
            Commands::Run { config } | Commands::Replay { config, .. } if config.debug
        );
    init_tracing(debug, cli.log_json);

    let result = match cli.command {
        Commands::Run { config } => cli::run_cmd::run(&config, mode).await,
        Commands::Replay { config, max_polls } => cli::replay_cmd::run(&config, max_polls, mode).await,
        Commands::Doctor { config } => cli::doctor::run(&config, mode).await,
        Commands::Filename {
            doc_type,
            number,
            subject,
        } => cli::filename_cmd::run(&doc_type, &number, &subject, mode),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "normas", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if mode.is_json() {
            output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else if !mode.is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
