use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use mutrec_core::RunConfig;

use super::cli::DEFAULT_CONFIG_OUT;

pub fn write_config_template(matches: &ArgMatches) -> Result<()> {
    let output = matches
        .get_one::<String>("output")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_CONFIG_OUT);
    let output = Path::new(output);

    if output.exists() && !matches.get_flag("force") {
        anyhow::bail!("{} already exists, use --force to overwrite it", output.display());
    }

    RunConfig::default()
        .to_file(output)
        .with_context(|| format!("Can't write {}", output.display()))?;
    info!("Configuration template written to {}", output.display());

    Ok(())
}
