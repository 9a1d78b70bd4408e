pub use crate::config::{validate_block_size, Backend, ScanConfig, DEFAULT_BLOCK_SIZE};
pub use crate::error::{Result, ScanError};
pub use crate::scan::{ScanBackend, ScanStats};
