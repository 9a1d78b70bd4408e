use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("no suitable GPU adapter found: {0}")]
    NoAdapter(String),
    #[error("failed to create GPU device: {0}")]
    DeviceRequest(String),
    #[error("failed to build {label}: {log}")]
    ShaderCompile { label: &'static str, log: String },
    #[error("GPU execution failed: {0}")]
    Execution(String),
    #[error("invalid block size {block_size}: {reason}")]
    InvalidBlockSize { block_size: usize, reason: String },
    #[error("sequence of {len} elements exceeds the device limit of {max}")]
    TooLarge { len: usize, max: usize },
    #[error("sequence length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("parse error at token {index}: {message}")]
    Parse { index: usize, message: String },
    #[error("invalid configuration")]
    Config(#[from] serde_yml::Error),
    #[error("IO error")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
