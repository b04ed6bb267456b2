use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    ExitStatus { program: String, status: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Terminal error: {0}")]
    Terminal(String),
}

pub type Result<T> = std::result::Result<T, BootsError>;
