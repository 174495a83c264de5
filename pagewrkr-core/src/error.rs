pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("`workers` must be a positive integer")]
    InvalidWorkers,

    #[error("`requests_per_worker` must be a positive integer")]
    InvalidRequestsPerWorker,

    #[error("`size` must be a positive integer")]
    InvalidSize,

    #[error("`pages` must satisfy 1 <= start <= end")]
    InvalidPageRange,

    #[error("`jitter.min` must be <= `jitter.max`")]
    InvalidJitter,

    #[error("`request_timeout` must be a positive duration")]
    InvalidRequestTimeout,

    #[error("`run_timeout` must be a positive duration the clock can represent")]
    InvalidRunTimeout,

    #[error("`progress_interval` must be a positive duration the clock can represent")]
    InvalidProgressInterval,

    #[error("a base url is required (set `baseUrl` or pass --base-url)")]
    MissingBaseUrl,

    #[error("invalid endpoint url: `{0}`")]
    InvalidEndpoint(String),

    #[error("invalid threshold `{expr}`: {error}")]
    InvalidThreshold { expr: String, error: String },

    #[error("run lost outcomes: expected {expected}, recorded {recorded}")]
    LostOutcomes { expected: u64, recorded: u64 },
}
