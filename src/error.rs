use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaprError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Config(#[from] serde_json::Error),
    #[error("'{0}' is reserved for a game command and cannot be the tap key")]
    ReservedTapKey(char),
    #[error("tick interval {0}ms is outside 10..=1000ms")]
    TickInterval(u64),
    #[error("logger already initialised: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error("stdin must be a tty")]
    NotATty,
}

pub type Result<T> = std::result::Result<T, TaprError>;
