use clap::{Arg, ArgAction, Command};

pub const CONFIG_CMD: &str = "config";
pub const DEFAULT_CONFIG_OUT: &str = "mutrec.toml";

pub fn create_config_cli() -> Command {
    Command::new(CONFIG_CMD)
        .about("Write a configuration file with the default run parameters")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output configuration file")
                .default_value(DEFAULT_CONFIG_OUT),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite an existing file")
                .action(ArgAction::SetTrue),
        )
}
