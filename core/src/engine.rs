//! The job execution state machine: submit, poll, fetch results, clean up.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

use crate::client::{ServiceClient, WireInput, WireJobRequest, WireOption};
use crate::error::PipelineError;
use crate::model::{Job, JobRequest, JobStatus, Message};
use crate::persist;

/// Interval between polls while a job is running.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Flags controlling how a submitted job is driven and cleaned up.
///
/// Message suppression (`--quiet`) is the caller's concern: it decides
/// whether to act on the `RunEvent`s this emits, so it isn't a field here.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub persistent: bool,
    pub background: bool,
    pub output: Option<PathBuf>,
}

/// One event emitted while driving a job: either an incremental message or
/// (exactly once, last) the terminal status.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Progress(Message),
    Terminal(JobStatus),
}

/// Outcome of a full `run()` call.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub job_id: String,
    pub final_status: Option<JobStatus>,
}

fn wire_request(req: &JobRequest, href: String) -> WireJobRequest {
    let inputs = req
        .inputs
        .iter()
        .map(|(name, items)| WireInput { name: name.clone(), items: items.clone() })
        .collect();

    let options = req
        .options
        .iter()
        .map(|(name, values)| {
            if values.len() > 1 {
                WireOption::Items { name: name.clone(), items: values.clone() }
            } else {
                WireOption::Scalar {
                    name: name.clone(),
                    value: values.first().cloned().unwrap_or_default(),
                }
            }
        })
        .collect();

    WireJobRequest {
        href,
        nicename: req.nicename.clone(),
        inputs,
        options,
        background: req.background,
    }
}

/// Submit `req`, drive it to completion per `opts`, and report the outcome.
///
/// `on_event` is called for every progress message and for the single
/// terminal event; it is the caller's responsibility to print or discard
/// these (quiet suppression is the caller's concern, handled by the CLI
/// layer before constructing the callback, not here).
pub async fn run<C: ServiceClient>(
    client: &C,
    req: JobRequest,
    opts: RunOptions,
    mut on_event: impl FnMut(&RunEvent),
) -> Result<RunOutcome> {
    if opts.background && opts.output.is_some() {
        warn!("--output is ignored together with --background");
    }
    if !opts.background && opts.output.is_none() {
        return Err(PipelineError::Usage(
            "an output directory (--output) is required unless --background is set".to_string(),
        )
        .into());
    }

    let href = client.script_url(&req.script_id);
    let wire = wire_request(&req, href);
    let payload = req.payload.clone();
    let background = req.background;

    let job = client.submit_job(wire, payload).await?;
    info!(job_id = %job.id, "job submitted");
    println!("Job Id: {}", job.id);

    if background || opts.persistent {
        persist::write_last_id(&job.id).await?;
    }

    if background {
        return Ok(RunOutcome { job_id: job.id, final_status: None });
    }

    let final_status = poll_to_terminal(client, &job.id, &mut on_event).await?;

    if final_status != JobStatus::Error {
        if let Some(output) = &opts.output {
            let archive = client.results(&job.id).await?;
            extract_zip(&archive, output)?;
        }
        if !opts.persistent {
            client.delete_job(&job.id).await?;
        }
    }

    Ok(RunOutcome { job_id: job.id, final_status: Some(final_status) })
}

async fn poll_to_terminal<C: ServiceClient>(
    client: &C,
    job_id: &str,
    on_event: &mut impl FnMut(&RunEvent),
) -> Result<JobStatus> {
    let mut cursor: u64 = 0;
    loop {
        let Job { status, messages, .. } = client.job(job_id, cursor).await?;

        for message in messages {
            cursor = message.sequence;
            on_event(&RunEvent::Progress(message));
        }

        if status.is_terminal() {
            on_event(&RunEvent::Terminal(status));
            return Ok(status);
        }

        sleep(POLL_INTERVAL).await;
    }
}

/// Extract a results archive into `dest`, rejecting any entry whose
/// (cleaned) path would escape it.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)
        .map_err(|e| PipelineError::LocalIo(format!("creating output directory: {e}")))?;

    let reader = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| PipelineError::LocalIo(format!("reading results archive: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| PipelineError::LocalIo(format!("reading archive entry: {e}")))?;
        let Some(name) = entry.enclosed_name() else { continue };
        let clean = clean_path(&name);
        let target = dest.join(clean);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(|e| PipelineError::LocalIo(format!("creating directory: {e}")))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PipelineError::LocalIo(format!("creating directory: {e}")))?;
        }
        let mut out = std::fs::File::create(&target)
            .map_err(|e| PipelineError::LocalIo(format!("writing {}: {e}", target.display())))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| PipelineError::LocalIo(format!("writing {}: {e}", target.display())))?;
    }
    Ok(())
}

/// Strip any `..`/root components from a path, the same traversal-safety
/// guarantee `filepath.Clean` + join gives the original client.
fn clean_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_path_drops_parent_and_root_components() {
        let p = Path::new("/a/../../etc/passwd");
        assert_eq!(clean_path(p), PathBuf::from("a/etc/passwd"));
    }

    #[test]
    fn wire_request_single_value_option_is_scalar() {
        let mut req = JobRequest { script_id: "test".to_string(), ..Default::default() };
        req.options.insert("x".to_string(), vec!["one".to_string()]);
        let wire = wire_request(&req, "http://host/scripts/test".to_string());
        assert!(matches!(wire.options[0], WireOption::Scalar { .. }));
    }

    #[test]
    fn wire_request_multi_value_option_is_items() {
        let mut req = JobRequest { script_id: "test".to_string(), ..Default::default() };
        req.options.insert("x".to_string(), vec!["one".to_string(), "two".to_string()]);
        let wire = wire_request(&req, "http://host/scripts/test".to_string());
        assert!(matches!(wire.options[0], WireOption::Items { .. }));
    }
}
