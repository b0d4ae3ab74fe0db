//! `khata config ...`

use std::path::PathBuf;

use super::{ConfigArgs, ConfigCommand};
use crate::config::KhataConfig;
use crate::error::{CliError, CliResult};

pub fn run(
    args: ConfigArgs,
    config: &KhataConfig,
    config_path: Option<PathBuf>,
    json: bool,
) -> CliResult<()> {
    match args.command {
        ConfigCommand::Show => {
            let body = if json {
                serde_json::to_string_pretty(config).map_err(|e| CliError::internal(e.to_string()))?
            } else {
                toml::to_string_pretty(config).map_err(|e| CliError::internal(e.to_string()))?
            };
            println!("{}", body);
            Ok(())
        }
        ConfigCommand::Init { force } => {
            let path = config_path
                .or_else(KhataConfig::default_config_path)
                .ok_or_else(|| CliError::config("No config path available"))?;
            if path.exists() && !force {
                return Err(CliError::config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            let path = config.save(Some(path))?;
            println!("✓ Wrote {}", path.display());
            Ok(())
        }
    }
}
