mod config;
mod run;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "mutrec";
    pub const BIN_NAME: &str = "mutrec";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Find genomic elements whose mutations are more recurrent than expected from the background mutation rate.")
        .subcommand_required(true)
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Show debug log messages")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(run::cli::create_run_cli())
        .subcommand(config::cli::create_config_cli())
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();
    init_logging(matches.get_flag("debug"));
    log::debug!("{} {}", consts::PKG_NAME, consts::VERSION);

    match matches.subcommand() {
        //
        // RUN
        //
        Some((run::cli::RUN_CMD, matches)) => {
            run::handlers::run_analysis(matches)?;
        }

        //
        // CONFIG TEMPLATE
        //
        Some((config::cli::CONFIG_CMD, matches)) => {
            config::handlers::write_config_template(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
