//! `dp2`: submit and monitor DAISY Pipeline 2 conversion jobs.

mod commands;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use pipeline_core::bringup::ensure_alive;
use pipeline_core::cli::{apply_config_flags, with_config_flags};
use pipeline_core::client::HttpServiceClient;
use pipeline_core::config::Config;
use pipeline_core::error::exit_code_for;
use pipeline_core::synth::synthesize;

const VERSION: &str = "2.0.0";

fn static_commands() -> Vec<Command> {
    let id_arg = || Arg::new("job_id").value_name("JOB_ID").required(false);
    let last_id_flag = || {
        Arg::new("lastid")
            .long("lastid")
            .short('l')
            .action(ArgAction::SetTrue)
            .help("act on the last submitted job id")
    };

    vec![
        Command::new("status")
            .about("print a job's status")
            .arg(id_arg())
            .arg(last_id_flag())
            .arg(Arg::new("verbose").long("verbose").short('v').action(ArgAction::SetTrue)),
        Command::new("delete")
            .about("delete a job")
            .arg(id_arg())
            .arg(last_id_flag()),
        Command::new("results")
            .about("fetch a job's results")
            .arg(id_arg())
            .arg(last_id_flag())
            .arg(Arg::new("output").long("output").short('o').value_name("DIR").required(true)),
        Command::new("log")
            .about("fetch a job's log")
            .arg(id_arg())
            .arg(last_id_flag())
            .arg(Arg::new("output").long("output").short('o').value_name("FILE")),
        Command::new("jobs").about("list all jobs"),
        Command::new("queue").about("show the job queue"),
        Command::new("moveup")
            .about("raise a job's queue priority")
            .arg(id_arg())
            .arg(last_id_flag()),
        Command::new("movedown")
            .about("lower a job's queue priority")
            .arg(id_arg())
            .arg(last_id_flag()),
        Command::new("halt").about("halt the service"),
        Command::new("version").about("print client and server version"),
    ]
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("dp2: {e:?}");
            code
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<()> {
    let mut root = Command::new("dp2")
        .version(VERSION)
        .about("DAISY Pipeline 2 CLI client")
        .allow_external_subcommands(true);
    root = with_config_flags(root);
    for cmd in static_commands() {
        root = root.subcommand(cmd);
    }

    // A first pass just to resolve config (script synthesis needs bring-up
    // to know the catalog and whether the server is local). Script
    // subcommands aren't registered yet, so unknown ones are accepted as
    // external and their own arguments are not validated here.
    let prelim = root.get_matches();

    let mut config = Config::new();
    apply_config_flags(&mut config, &prelim)?;

    init_logging(config.debug());

    let mut client = HttpServiceClient::new(config.url(), config.timeout_seconds())?;
    let facts = ensure_alive(&mut client, &config).await?;

    let scripts = client.scripts().await?;
    let script_by_id: std::collections::HashMap<_, _> =
        scripts.iter().map(|s| (s.id.clone(), s.clone())).collect();

    let mut full = Command::new("dp2").version(VERSION).about("DAISY Pipeline 2 CLI client");
    full = with_config_flags(full);
    for cmd in static_commands() {
        full = full.subcommand(cmd);
    }
    for cmd in synthesize(&scripts, facts.is_local()) {
        full = full.subcommand(cmd);
    }

    let matches = full.get_matches();

    match matches.subcommand() {
        Some(("status", sub)) => commands::status(&client, sub).await,
        Some(("delete", sub)) => commands::delete(&client, sub).await,
        Some(("results", sub)) => commands::results(&client, sub).await,
        Some(("log", sub)) => commands::log(&client, sub).await,
        Some(("jobs", _)) => commands::jobs(&client).await,
        Some(("queue", _)) => commands::queue(&client).await,
        Some(("moveup", sub)) => commands::move_up(&client, sub).await,
        Some(("movedown", sub)) => commands::move_down(&client, sub).await,
        Some(("halt", _)) => commands::halt(&client).await,
        Some(("version", _)) => commands::version(&facts, VERSION),
        Some((script_id, sub)) => {
            let descriptor = script_by_id.get(script_id).ok_or_else(|| {
                pipeline_core::PipelineError::Usage(format!("unknown command '{script_id}'"))
            })?;
            commands::run_script(&client, descriptor, sub, facts.is_local()).await
        }
        None => {
            Err(pipeline_core::PipelineError::Usage("no command given; see --help".to_string())
                .into())
        }
    }
}

fn init_logging(debug: bool) {
    use tracing_subscriber::EnvFilter;
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
