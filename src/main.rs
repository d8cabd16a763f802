// ABOUTME: Entry point for the skiff CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, ConnectionArgs};
use skiff::config::{self, Config, Target};
use skiff::error::{Error, Result};
use skiff::output::{Output, OutputMode};
use skiff::session::SessionConfig;
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::List { dir, local } if local => commands::list_local(&dir),
        Commands::List { dir, .. } => {
            let config = resolve_session_config(&cli.connection)?;
            commands::list_entries(config, &dir, output).await
        }
        Commands::Exec { commands: cmds, env } => {
            let config = resolve_session_config(&cli.connection)?;
            commands::exec_commands(config, &cmds, &env, output).await
        }
        Commands::Upload { local, remote } => {
            let config = resolve_session_config(&cli.connection)?;
            commands::upload_file(config, &local, &remote, output).await
        }
        Commands::Download { remote, local } => {
            let config = resolve_session_config(&cli.connection)?;
            commands::download_file(config, &remote, local, output).await
        }
        Commands::Write { remote } => {
            let config = resolve_session_config(&cli.connection)?;
            commands::write_file(config, &remote, output).await
        }
        Commands::Cat { remote } => {
            let config = resolve_session_config(&cli.connection)?;
            commands::cat_file(config, &remote, output).await
        }
    }
}

/// Merge skiff.yml with command-line overrides into a SessionConfig.
fn resolve_session_config(conn: &ConnectionArgs) -> Result<SessionConfig> {
    let cwd = env::current_dir()?;
    let mut config = Config::discover(&cwd)?;

    if let Some(target) = &conn.target {
        let target = Target::parse(target).map_err(Error::InvalidConfig)?;
        config.host = Some(target.host);
        if let Some(port) = target.port {
            config.port = port;
        }
        if let Some(user) = target.user {
            config.user = Some(user);
        }
    }
    if let Some(host) = &conn.host {
        config.host = Some(host.clone());
    }
    if let Some(user) = &conn.user {
        config.user = Some(user.clone());
    }
    if let Some(port) = conn.port {
        config.port = port;
    }
    if let Some(key_path) = &conn.key_path {
        config.key_path = Some(key_path.clone());
    }
    if conn.trust {
        config.trust = true;
    }
    if let Some(secs) = conn.connect_timeout {
        config.connect_timeout = Duration::from_secs(secs);
    }

    let password = match &conn.password_env {
        Some(var) => Some(env::var(var).map_err(|_| Error::MissingEnvVar(var.clone()))?),
        None => None,
    };

    config.session_config(password)
}
