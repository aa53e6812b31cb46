use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RichInputErr>;

/// Errors raised at the edges of the engine: loading configuration and
/// directory files. Editing operations themselves never fail.
#[derive(Error, Debug)]
pub enum RichInputErr {
    #[error("could not find home directory")]
    HomeDirNotFound,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
