//! LastId persistence and the (read-only) halt-key file.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::error::PipelineError;

/// Platform-specific path to the last-submitted-job-id file.
pub fn last_id_path() -> Result<PathBuf> {
    if cfg!(target_os = "windows") {
        let appdata = dirs::config_dir()
            .ok_or_else(|| PipelineError::LocalIo("cannot determine %APPDATA%".to_string()))?;
        return Ok(appdata.join("DAISY Pipeline 2").join("dp2").join("lastid"));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| PipelineError::LocalIo("cannot determine home directory".to_string()))?;

    if cfg!(target_os = "macos") {
        return Ok(home
            .join("Library")
            .join("Application Support")
            .join("DAISY Pipeline 2")
            .join("dp2")
            .join("lastid"));
    }

    Ok(home.join(".daisy-pipeline").join("dp2").join("lastid"))
}

/// Truncate-and-write the given id as the new LastId; last writer wins.
pub async fn write_last_id(id: &str) -> Result<()> {
    let path = last_id_path()?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    tokio::fs::write(&path, id)
        .await
        .with_context(|| format!("writing last id to {}", path.display()))?;
    Ok(())
}

/// Read the previously persisted LastId.
pub async fn read_last_id() -> Result<String> {
    let path = last_id_path()?;
    let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
        PipelineError::Usage(format!(
            "no last job id is recorded ({}: {e})",
            path.display()
        ))
    })?;
    Ok(contents.trim().to_string())
}

/// Resolve the job id a command should act on: the explicit positional
/// argument if given, otherwise LastId if `--lastid` was passed.
pub async fn resolve_id(positional: Option<&str>, use_last_id: bool) -> Result<String> {
    match (positional, use_last_id) {
        (Some(id), false) => Ok(id.to_string()),
        (None, true) => read_last_id().await,
        (Some(_), true) => Err(PipelineError::Usage(
            "specify either a job id or --lastid, not both".to_string(),
        )
        .into()),
        (None, false) => {
            Err(PipelineError::Usage("this command needs a job id".to_string()).into())
        }
    }
}

/// Read the halt key written by the server into the system temp directory.
///
/// This file is an external contract: the server writes it, the client
/// only ever reads it.
pub async fn read_halt_key() -> Result<String> {
    let path = std::env::temp_dir().join("dp2key.txt");
    tokio::fs::read_to_string(&path)
        .await
        .map(|s| s.trim().to_string())
        .with_context(|| format!("reading halt key from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_id_prefers_explicit_positional() {
        let id = resolve_id(Some("abc123"), false).await.unwrap();
        assert_eq!(id, "abc123");
    }

    #[tokio::test]
    async fn resolve_id_rejects_both() {
        assert!(resolve_id(Some("abc123"), true).await.is_err());
    }

    #[tokio::test]
    async fn resolve_id_rejects_neither() {
        assert!(resolve_id(None, false).await.is_err());
    }
}
