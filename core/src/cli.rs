//! Shared CLI shell pieces used by both binaries: global config flags and
//! the "fetch from the service, render with a formatter" command helper.

use clap::{Arg, ArgMatches, Command};

use crate::config::{self, Config};

/// Register one global long flag per recognized configuration key, plus
/// `--file/-f` to overlay a YAML document.
pub fn with_config_flags(cmd: Command) -> Command {
    let mut cmd = cmd.arg(
        Arg::new("config-file")
            .long("file")
            .short('f')
            .value_name("PATH")
            .global(true)
            .help("overlay a YAML configuration file"),
    );
    for (key, type_name) in config::recognized_keys() {
        cmd = cmd.arg(
            Arg::new(*key)
                .long(*key)
                .value_name(type_name.to_uppercase())
                .global(true)
                .help(format!("override the '{key}' configuration key ({type_name})")),
        );
    }
    cmd
}

/// Apply `--file` and any recognized per-key flags found in `matches` onto
/// `config`, in that order (file overlay first, flags take precedence).
pub fn apply_config_flags(config: &mut Config, matches: &ArgMatches) -> anyhow::Result<()> {
    if let Some(path) = matches.get_one::<String>("config-file") {
        config.overlay_yaml_file(std::path::Path::new(path))?;
    }
    for (key, _) in config::recognized_keys() {
        if let Some(value) = matches.get_one::<String>(key) {
            config.set_from_cli(key, value)?;
        }
    }
    Ok(())
}

/// Captures the "fetch one thing from the service, render it with a
/// formatter" shape shared by most read-only admin/status commands.
///
/// `fetch` performs the service call; `render` turns the result into the
/// text printed to stdout. Keeping this as a plain function rather than a
/// struct keeps call sites a one-line registration plus a closure.
pub async fn templated<T>(
    fetch: impl std::future::Future<Output = anyhow::Result<T>>,
    render: impl FnOnce(&T) -> String,
) -> anyhow::Result<String> {
    let value = fetch.await?;
    Ok(render(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_flags_include_every_recognized_key() {
        let cmd = with_config_flags(Command::new("test"));
        for (key, _) in config::recognized_keys() {
            assert!(cmd.get_arguments().any(|a| a.get_id() == key), "missing flag for {key}");
        }
    }

    #[tokio::test]
    async fn templated_renders_fetched_value() {
        let out = templated(async { Ok::<_, anyhow::Error>(42) }, |v| format!("value: {v}")).await.unwrap();
        assert_eq!(out, "value: 42");
    }
}
