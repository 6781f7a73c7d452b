//! Configuration and report store backends.
//!
//! Implements the `ReportStore` trait for a local directory, a remote HTTP
//! reports API, and an in-process store, plus the TOML configuration that
//! selects between them.

pub mod config;
pub mod file;
pub mod http;
pub mod memory;

pub use config::{create_store, load_config, load_config_from, ExamkitConfig, StoreConfig};
pub use file::FileReportStore;
pub use http::HttpReportStore;
pub use memory::MemoryReportStore;
