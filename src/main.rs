// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use anyhow::Result;
use clap::{Parser, Subcommand};
use kube::{Client, CustomResourceExt};
use tracing::*;

use lunar_controller::config::{ControllerConfig, LogFormat};
use lunar_controller::controller;
use lunar_controller::moon_types::Moon;
use lunar_controller::solar_types::Solar;
use lunar_controller::telemetry::init_logging;

#[derive(Parser)]
#[command(name = "lunar-controller", version, about)]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, env = "LUNAR_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, global = true, env = "LUNAR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the Moon and Solar custom resource definitions as YAML
    Export,
    /// Run both controllers against the current kubeconfig context
    Run(ControllerConfig),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Command::Export => {
            info!("exporting custom resource definitions");
            println!("{}", serde_yaml::to_string(&Moon::crd())?);
            println!("---");
            println!("{}", serde_yaml::to_string(&Solar::crd())?);
        }
        Command::Run(config) => {
            config.validate()?;
            info!("running lunar-controller");
            let client = Client::try_default().await?;
            controller::run(client, config).await?;
        }
    }
    Ok(())
}
