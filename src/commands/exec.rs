// ABOUTME: Exec command implementation.
// ABOUTME: Runs each given command on the remote host and prints its output.

use skiff::error::{Error, Result};
use skiff::output::Output;
use skiff::session::{Session, SessionConfig};
use std::collections::HashMap;

/// Parse KEY=VALUE pairs from the command line.
pub fn parse_env_pairs(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut env = HashMap::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(Error::InvalidConfig(format!(
                "environment variable must be KEY=VALUE, got: {}",
                pair
            )));
        };
        if name.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "environment variable name cannot be empty: {}",
                pair
            )));
        }
        env.insert(name.to_string(), value.to_string());
    }
    Ok(env)
}

pub async fn exec_commands(
    config: SessionConfig,
    commands: &[String],
    env_pairs: &[String],
    output: &Output,
) -> Result<()> {
    let env = parse_env_pairs(env_pairs)?;
    let env = if env.is_empty() { None } else { Some(&env) };

    output.progress(&format!("Connecting to {}...", config.host));
    let mut session = Session::connect(config).await?;

    let results = match session.run_commands(commands, env).await {
        Ok(results) => results,
        Err(e) => {
            if let Err(disconnect_err) = session.disconnect().await {
                output.warning(&format!(
                    "failed to close session cleanly: {}",
                    disconnect_err
                ));
            }
            return Err(e.into());
        }
    };

    let mut first_failure = None;
    for (command, result) in commands.iter().zip(&results) {
        print!("{}", result.stdout);
        eprint!("{}", result.stderr);
        if !result.success() && first_failure.is_none() {
            first_failure = Some(Error::RemoteCommand {
                command: command.clone(),
                exit_code: result.exit_code,
            });
        }
    }

    session.disconnect().await?;

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
