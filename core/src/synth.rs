//! Turns server-provided script descriptors into `clap` subcommands.
//!
//! Script commands are not known at compile time, so they are built with
//! `clap`'s builder API (`Command`/`Arg`) rather than the derive macros the
//! binaries use for their static subcommands.

use clap::{Arg, ArgAction, Command};

use crate::model::ScriptDescriptor;

/// Flag prefix for a script's input ports.
pub const INPUT_PREFIX: &str = "i-";
/// Flag prefix for a script's options.
pub const OPTION_PREFIX: &str = "x-";

/// Build one `clap::Command` per script descriptor, with flags for every
/// input and option plus the standard execution flags.
pub fn synthesize(scripts: &[ScriptDescriptor], is_local: bool) -> Vec<Command> {
    scripts.iter().map(|s| script_command(s, is_local)).collect()
}

fn script_command(script: &ScriptDescriptor, is_local: bool) -> Command {
    let mut cmd = Command::new(script.id.clone()).about(script.description.clone());

    for input in &script.inputs {
        let flag = format!("{INPUT_PREFIX}{}", input.name);
        cmd = cmd.arg(
            Arg::new(flag.clone())
                .long(flag)
                .value_name("PATHS")
                .required(true)
                .help(input.description.clone()),
        );
    }

    for option in &script.options {
        let flag = format!("{OPTION_PREFIX}{}", option.name);
        cmd = cmd.arg(
            Arg::new(flag.clone())
                .long(flag)
                .value_name("VALUE")
                .required(option.required)
                .help(option.description.clone()),
        );
    }

    cmd = cmd
        .arg(Arg::new("nicename").long("nicename").short('n').value_name("NAME"))
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("persistent")
                .long("persistent")
                .short('p')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("background")
                .long("background")
                .short('b')
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("output").long("output").short('o').value_name("DIR"));

    if !is_local {
        cmd = cmd.arg(
            Arg::new("data")
                .long("data")
                .short('d')
                .value_name("PATH")
                .required(true)
                .help("local file whose bytes become the job payload"),
        );
    }

    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InputDescriptor, OptionDescriptor};

    fn sample_script() -> ScriptDescriptor {
        ScriptDescriptor {
            id: "test".to_string(),
            nicename: "Test script".to_string(),
            description: "a script for testing".to_string(),
            homepage: None,
            href: "http://localhost:8181/ws/scripts/test".to_string(),
            inputs: vec![
                InputDescriptor { name: "source".to_string(), description: "source doc".to_string(), sequence: false },
                InputDescriptor { name: "single".to_string(), description: "single doc".to_string(), sequence: false },
            ],
            options: vec![
                OptionDescriptor {
                    name: "test-opt".to_string(),
                    description: "a required option".to_string(),
                    required: true,
                    option_type: "anyFileURI".to_string(),
                    sequence: false,
                },
                OptionDescriptor {
                    name: "another-opt".to_string(),
                    description: "an optional boolean".to_string(),
                    required: false,
                    option_type: "boolean".to_string(),
                    sequence: false,
                },
            ],
        }
    }

    #[test]
    fn one_command_per_script() {
        let cmds = synthesize(&[sample_script()], true);
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].get_name(), "test");
    }

    #[test]
    fn inputs_become_mandatory_flags() {
        let cmd = script_command(&sample_script(), true);
        let arg = cmd.get_arguments().find(|a| a.get_id() == "i-source").unwrap();
        assert!(arg.is_required_set());
    }

    #[test]
    fn required_options_become_mandatory_flags() {
        let cmd = script_command(&sample_script(), true);
        let required = cmd.get_arguments().find(|a| a.get_id() == "x-test-opt").unwrap();
        assert!(required.is_required_set());
        let optional = cmd.get_arguments().find(|a| a.get_id() == "x-another-opt").unwrap();
        assert!(!optional.is_required_set());
    }

    #[test]
    fn data_flag_present_only_when_not_local() {
        let remote_cmd = script_command(&sample_script(), false);
        assert!(remote_cmd.get_arguments().any(|a| a.get_id() == "data"));

        let local_cmd = script_command(&sample_script(), true);
        assert!(!local_cmd.get_arguments().any(|a| a.get_id() == "data"));
    }
}
