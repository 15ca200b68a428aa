#![expect(clippy::print_stdout, reason = "CLI output is emitted here")]
#![expect(clippy::print_stderr, reason = "CLI output is emitted here")]

//! CLI application layer and composition root wiring.

use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tracing::debug;

pub mod commands;
pub mod error;
pub mod server;

use crate::app::commands::Cli;
use crate::app::commands::Commands;
use crate::app::commands::ServeArgs;
use crate::app::error::ServerError;
use crate::app::server::ServeOptions;
use crate::app::server::build_guard_state;
use crate::common::init_tracing;
use crate::domain::MemorySnapshot;
use crate::global;
use crate::infra::GuardConfig;
use crate::infra::TokioSpawner;

/// Exit codes following sysexits.h.
mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const UNAVAILABLE: i32 = 69;
}

#[derive(Debug, Default)]
pub struct Application;

impl Application {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self) -> Result<i32> {
        let exit_code = match self.execute() {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => self.handle_error(e),
        };
        Ok(exit_code)
    }

    fn execute(&self) -> Result<()> {
        let cli = Cli::parse();
        let _telemetry = init_tracing(if cli.verbose { "debug" } else { "info" });
        debug!(command = ?cli.command, "CLI command parsed");

        match cli.command {
            Commands::Serve(args) => run_serve(&args),
            Commands::Status { json } => run_status(json),
        }
    }

    fn handle_error(&self, err: anyhow::Error) -> i32 {
        eprintln!("Error: {err:#}");
        if err.downcast_ref::<ServerError>().is_some() {
            exit_codes::UNAVAILABLE
        } else {
            exit_codes::GENERAL_ERROR
        }
    }
}

fn run_serve(args: &ServeArgs) -> Result<()> {
    let config = args.apply(GuardConfig::from_env());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let spawner = Arc::new(TokioSpawner::new(runtime.handle().clone()));
    let state = build_guard_state(&config, spawner);
    let options = ServeOptions::new(args.listen.clone(), config);

    runtime.block_on(server::serve(options, state))?;
    Ok(())
}

fn run_status(json: bool) -> Result<()> {
    let snapshot = global::default_provider().snapshot();
    if json {
        let body =
            serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;
        println!("{body}");
    } else {
        print!("{}", format_status(&snapshot));
    }
    Ok(())
}

fn format_status(snapshot: &MemorySnapshot) -> String {
    format!(
        "total:         {} bytes\n\
         available:     {} bytes\n\
         used:          {} bytes\n\
         used_fraction: {:.4}\n",
        snapshot.total_bytes, snapshot.available_bytes, snapshot.used_bytes, snapshot.used_fraction
    )
}
