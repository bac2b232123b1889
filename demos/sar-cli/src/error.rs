use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read config file {0}: {1}")]
    ConfigFile(PathBuf, #[source] std::io::Error),

    #[error("could not parse config file {0}: {1}")]
    ConfigParse(PathBuf, #[source] toml::de::Error),

    #[error(transparent)]
    Sim(#[from] sar_sim::SimError),

    #[error(transparent)]
    Output(#[from] sar_output::OutputError),
}

pub type CliResult<T> = Result<T, CliError>;
