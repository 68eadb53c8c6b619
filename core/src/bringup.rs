//! Bring-up: make sure the service is reachable before any command runs.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::client::ServiceClient;
use crate::config::Config;
use crate::error::PipelineError;
use crate::model::ServerFacts;

/// Interval between liveness probes while waiting for a freshly launched
/// service to come up.
const PROBE_INTERVAL: Duration = Duration::from_millis(333);

/// Token appended to `JAVA_OPTS` when launching a local service, so it
/// starts in a mode suitable for being driven by this client.
const GOSH_ARGS: &str = "-Dgosh.args=--noi";

/// Ensure the service behind `client` is reachable, starting it locally if
/// configured to and it isn't already, then return the facts it reports.
///
/// Idempotent: calling it again after success re-probes and returns
/// immediately.
pub async fn ensure_alive<C: ServiceClient>(client: &mut C, config: &Config) -> Result<ServerFacts> {
    match client.alive().await {
        Ok(facts) => return finish(client, config, facts).await,
        Err(e) => {
            debug!("initial liveness probe failed: {e}");
        }
    }

    if !config.starting() {
        return Err(PipelineError::Connectivity(
            "service is not reachable and client is not configured to start one".to_string(),
        )
        .into());
    }

    launch_local(config)?;

    let deadline = Instant::now() + Duration::from_secs(config.ws_timeup().max(0) as u64);
    loop {
        match client.alive().await {
            Ok(facts) => return finish(client, config, facts).await,
            Err(e) => {
                if Instant::now() >= deadline {
                    return Err(PipelineError::Connectivity(format!(
                        "service did not become reachable within {} seconds: {e}",
                        config.ws_timeup()
                    ))
                    .into());
                }
                sleep(PROBE_INTERVAL).await;
            }
        }
    }
}

async fn finish<C: ServiceClient>(
    client: &mut C,
    config: &Config,
    facts: ServerFacts,
) -> Result<ServerFacts> {
    if facts.authentication {
        let key = config.client_key();
        let secret = config.client_secret();
        if key.is_empty() || secret.is_empty() {
            return Err(PipelineError::Auth(
                "service requires authentication but client_key/client_secret are not set"
                    .to_string(),
            )
            .into());
        }
        client.set_credentials(key, secret);
    }
    info!(version = %facts.version, mode = %facts.mode, "service is up");
    Ok(facts)
}

fn launch_local(config: &Config) -> Result<()> {
    let exec_line = config.exec_line();
    if exec_line.is_empty() {
        return Err(PipelineError::Connectivity(
            "no local launch command configured (exec_line_nix/exec_line_win)".to_string(),
        )
        .into());
    }

    let mut parts = exec_line.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| PipelineError::Connectivity("empty launch command".to_string()))?;

    let mut cmd = Command::new(program);
    cmd.args(parts);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    for (key, value) in std::env::vars() {
        cmd.env(key, value);
    }
    cmd.env("JAVA_OPTS", append_java_opts(std::env::var("JAVA_OPTS").ok()));

    info!(command = %exec_line, "starting local service");
    cmd.spawn()
        .map_err(|e| PipelineError::Connectivity(format!("failed to start local service: {e}")))?;
    Ok(())
}

/// Append the gosh marker to an existing `JAVA_OPTS` value, preserving any
/// tokens already present and stripping a wrapping pair of quotes.
fn append_java_opts(existing: Option<String>) -> String {
    let trimmed = existing.unwrap_or_default();
    let unquoted = trimmed.trim_matches('"');
    if unquoted.is_empty() {
        GOSH_ARGS.to_string()
    } else {
        format!("{unquoted} {GOSH_ARGS}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_to_empty_java_opts() {
        assert_eq!(append_java_opts(None), GOSH_ARGS);
    }

    #[test]
    fn appends_to_existing_java_opts() {
        assert_eq!(
            append_java_opts(Some("-Xmx512m".to_string())),
            "-Xmx512m -Dgosh.args=--noi"
        );
    }

    #[test]
    fn strips_surrounding_quotes() {
        assert_eq!(
            append_java_opts(Some("\"-Xmx512m\"".to_string())),
            "-Xmx512m -Dgosh.args=--noi"
        );
    }
}
