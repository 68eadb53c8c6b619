//! Handlers for `dp2`'s standard commands and dynamically synthesized
//! script commands.

use anyhow::Result;
use clap::ArgMatches;
use pipeline_core::cli::templated;
use pipeline_core::client::ServiceClient;
use pipeline_core::engine::{self, RunEvent, RunOptions};
use pipeline_core::model::{Job, JobRequest, JobStatus, QueueEntry, ScriptDescriptor, ServerFacts};
use pipeline_core::persist;
use pipeline_core::synth::{INPUT_PREFIX, OPTION_PREFIX};
use pipeline_core::uri;

async fn job_id(sub: &ArgMatches) -> Result<String> {
    let positional = sub.get_one::<String>("job_id").map(String::as_str);
    let use_last = sub.get_flag("lastid");
    persist::resolve_id(positional, use_last).await
}

fn render_job(job: &Job, verbose: bool) -> String {
    let mut out = format!("Job Id: {}\nStatus: {}", job.id, job.status);
    if verbose {
        for message in &job.messages {
            out.push('\n');
            out.push_str(&message.to_string());
        }
    }
    out
}

fn render_queue(entries: &[QueueEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}\tpriority={:.2}\tjob_priority={:.2}\tclient_priority={:.2}\trelative_time={:.2}\t{}",
                entry.id,
                entry.computed_priority,
                entry.job_priority,
                entry.client_priority,
                entry.relative_time,
                entry.time_stamp
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn status<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = job_id(sub).await?;
    let verbose = sub.get_flag("verbose");
    let text = templated(client.job(&id, 0), |job| render_job(job, verbose)).await?;
    println!("{text}");
    Ok(())
}

pub async fn delete<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = job_id(sub).await?;
    client.delete_job(&id).await?;
    println!("deleted job {id}");
    Ok(())
}

pub async fn results<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = job_id(sub).await?;
    let output = sub.get_one::<String>("output").expect("required by clap");
    let bytes = client.results(&id).await?;
    engine::extract_zip(&bytes, std::path::Path::new(output))?;
    println!("results for job {id} written to {output}");
    Ok(())
}

pub async fn log<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = job_id(sub).await?;
    let bytes = client.log(&id).await?;
    match sub.get_one::<String>("output") {
        Some(path) => std::fs::write(path, &bytes)?,
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&bytes)?;
        }
    }
    Ok(())
}

pub async fn jobs<C: ServiceClient>(client: &C) -> Result<()> {
    let text = templated(client.jobs(), |jobs: &Vec<_>| {
        jobs.iter().map(|job: &Job| format!("{}\t{}", job.id, job.status)).collect::<Vec<_>>().join("\n")
    })
    .await?;
    println!("{text}");
    Ok(())
}

pub async fn queue<C: ServiceClient>(client: &C) -> Result<()> {
    let text = templated(client.queue(), |entries: &Vec<_>| render_queue(entries)).await?;
    println!("{text}");
    Ok(())
}

pub async fn move_up<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = job_id(sub).await?;
    let text = templated(client.move_up(&id), |entries: &Vec<_>| render_queue(entries)).await?;
    println!("{text}");
    Ok(())
}

pub async fn move_down<C: ServiceClient>(client: &C, sub: &ArgMatches) -> Result<()> {
    let id = job_id(sub).await?;
    let text = templated(client.move_down(&id), |entries: &Vec<_>| render_queue(entries)).await?;
    println!("{text}");
    Ok(())
}

pub async fn halt<C: ServiceClient>(client: &C) -> Result<()> {
    let key = persist::read_halt_key().await?;
    client.halt(&key).await?;
    println!("halted service");
    Ok(())
}

pub fn version(facts: &ServerFacts, cli_version: &str) -> Result<()> {
    println!("Cli Version: {cli_version}");
    println!("Version: {}", facts.version);
    println!("Authentication: {}", facts.authentication);
    Ok(())
}

/// Build a [`JobRequest`] from a synthesized script subcommand's matches
/// and drive it through the execution engine.
pub async fn run_script<C: ServiceClient>(
    client: &C,
    script: &ScriptDescriptor,
    sub: &ArgMatches,
    is_local: bool,
) -> Result<()> {
    let base = if is_local { Some(uri::local_base(&std::env::current_dir()?)?) } else { None };

    let mut req = JobRequest { script_id: script.id.clone(), ..Default::default() };
    req.nicename = sub.get_one::<String>("nicename").cloned();
    req.background = sub.get_flag("background");

    for input in &script.inputs {
        let flag = format!("{INPUT_PREFIX}{}", input.name);
        let raw = sub.get_one::<String>(&flag).expect("required by clap");
        let resolved = uri::resolve_paths(raw, base.as_ref())?;
        req.inputs.insert(input.name.clone(), resolved);
    }

    for option in &script.options {
        let flag = format!("{OPTION_PREFIX}{}", option.name);
        if let Some(raw) = sub.get_one::<String>(&flag) {
            let values = if option.is_uri_typed() {
                uri::resolve_paths(raw, base.as_ref())?
            } else {
                vec![raw.clone()]
            };
            req.options.insert(option.name.clone(), values);
        }
    }

    if !is_local {
        let data_path = sub.get_one::<String>("data").expect("required by clap");
        req.payload = Some(std::fs::read(data_path)?);
    }

    let quiet = sub.get_flag("quiet");
    let opts = RunOptions {
        persistent: sub.get_flag("persistent"),
        background: req.background,
        output: sub.get_one::<String>("output").map(Into::into),
    };

    // In quiet mode no message lines are printed; a spinner stands in so a
    // long-running job doesn't look hung.
    let spinner = quiet.then(|| {
        let bar = indicatif::ProgressBar::new_spinner();
        bar.set_style(
            indicatif::ProgressStyle::with_template("{spinner} {msg}")
                .expect("valid spinner template"),
        );
        bar.set_message("running...");
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        bar
    });

    let outcome = engine::run(client, req, opts, |event| match event {
        RunEvent::Progress(message) => {
            if let Some(bar) = &spinner {
                bar.set_message(message.content.clone());
            } else {
                println!("{message}");
            }
        }
        RunEvent::Terminal(status) => {
            if let Some(bar) = &spinner {
                bar.finish_and_clear();
            } else {
                println!("Status: {status}");
            }
        }
    })
    .await?;

    if let Some(JobStatus::Error) = outcome.final_status {
        return Err(pipeline_core::PipelineError::State(format!(
            "job {} ended in error",
            outcome.job_id
        ))
        .into());
    }

    Ok(())
}
