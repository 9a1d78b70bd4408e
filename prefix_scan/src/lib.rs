//! Prefix scan - work-efficient exclusive prefix sums of arbitrary length.
//!
//! Sequences are split into fixed-size chunks that one parallel work-group can
//! scan on its own. The per-chunk totals are scanned recursively to obtain
//! chunk offsets, which are then added back into every chunk.
//!
//! Two execution backends implement the chunk primitives:
//! - GPU: wgpu compute shaders, one work-group per chunk
//! - CPU: rayon, one task per chunk
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use prefix_scan::{Backend, ScanConfig, Scanner};
//!
//! let mut scanner = Scanner::new(ScanConfig::new(256, Backend::Auto))?;
//! let sums = scanner.scan(&[1.0, 2.0, 3.0])?;
//! assert_eq!(sums, vec![0.0, 1.0, 3.0]);
//! ```

mod config;
pub mod cpu;
mod error;
pub mod gpu;
pub mod io;
pub mod scan;
mod scanner;

#[cfg(test)]
mod test_utils;

pub mod prelude;

pub use prelude::*;
pub use scanner::Scanner;
