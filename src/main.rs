// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use consul_acl_init::config::Config;
use consul_acl_init::consul::{transport, ConsulClient};
use consul_acl_init::reconcile::{CredentialMode, Reconciler};
use consul_acl_init::store;

/// Bootstrap Consul ACLs, create the configured policies and tokens and
/// hand every member its agent token.
#[derive(Parser, Debug)]
#[command(name = "consul-acl-init")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short, long, env = "CONSUL_ACL_INIT_CONFIG")]
    config: PathBuf,

    /// Perform ACL bootstrap instead of reading the bootstrap token file
    #[arg(long)]
    bootstrap: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing, RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !store::exists(&cli.config) {
        bail!("config file [{}] does not exist", cli.config.display());
    }
    info!("Using config file [{}]", cli.config.display());

    let config = Config::from_file(&cli.config)?;

    let service = transport::build(&config)?;
    let client = ConsulClient::new(service, &config.scheme, &config.consul_address())?;
    info!(
        "Connecting to Consul running at [{}://{}]",
        config.scheme,
        client.address()
    );

    let mode = if cli.bootstrap {
        CredentialMode::Bootstrap
    } else {
        CredentialMode::LoadFromFile
    };

    let secrets = Reconciler::new(config, client).run(mode).await?;
    info!("Done, {} token secrets issued", secrets.len());

    Ok(())
}
