//! `dp2admin`: manage clients and runtime properties of a DAISY Pipeline 2
//! web service. Never fetches the script catalog.

mod commands;

use anyhow::Result;
use clap::{Arg, Command};
use pipeline_core::bringup::ensure_alive;
use pipeline_core::cli::{apply_config_flags, with_config_flags};
use pipeline_core::client::HttpServiceClient;
use pipeline_core::config::Config;
use pipeline_core::error::exit_code_for;

const VERSION: &str = "2.0.0";

fn commands_tree() -> Command {
    let mut root = Command::new("dp2admin").version(VERSION).about("DAISY Pipeline 2 admin CLI");
    root = with_config_flags(root);

    root = root
        .subcommand(Command::new("list").about("list registered clients"))
        .subcommand(
            Command::new("create")
                .about("register a new client")
                .arg(Arg::new("id").long("id").required(true))
                .arg(Arg::new("secret").long("secret").required(true))
                .arg(Arg::new("role").long("role").required(true))
                .arg(Arg::new("contact").long("contact")),
        )
        .subcommand(
            Command::new("modify")
                .about("modify an existing client")
                .arg(Arg::new("client_id").value_name("CLIENT_ID").required(true))
                .arg(Arg::new("secret").long("secret"))
                .arg(Arg::new("role").long("role"))
                .arg(Arg::new("contact").long("contact")),
        )
        .subcommand(
            Command::new("delete")
                .about("remove a client")
                .arg(Arg::new("client_id").value_name("CLIENT_ID").required(true)),
        )
        .subcommand(
            Command::new("client")
                .about("show a client's details")
                .arg(Arg::new("client_id").value_name("CLIENT_ID").required(true)),
        )
        .subcommand(Command::new("properties").about("list server runtime properties"))
        .subcommand(Command::new("sizes").about("show per-status job counts"))
        .subcommand(Command::new("halt").about("halt the service"));
    root
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("dp2admin: {e:?}");
            code
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<()> {
    let cmd = commands_tree();
    let matches = cmd.get_matches();

    let mut config = Config::new();
    apply_config_flags(&mut config, &matches)?;
    init_logging(config.debug());

    let mut client = HttpServiceClient::new(config.url(), config.timeout_seconds())?;
    ensure_alive(&mut client, &config).await?;

    match matches.subcommand() {
        Some(("list", _)) => commands::list(&client).await,
        Some(("create", sub)) => commands::create(&client, sub).await,
        Some(("modify", sub)) => commands::modify(&client, sub).await,
        Some(("delete", sub)) => commands::delete(&client, sub).await,
        Some(("client", sub)) => commands::show_client(&client, sub).await,
        Some(("properties", _)) => commands::properties(&client).await,
        Some(("sizes", _)) => commands::sizes(&client).await,
        Some(("halt", _)) => commands::halt(&client).await,
        _ => {
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
