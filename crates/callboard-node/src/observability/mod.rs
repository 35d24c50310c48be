//! # Observability Module
//!
//! Structured logging for the Callboard node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use callboard_node::observability::{init_logging, LogFormat};
//!
//! init_logging("info", LogFormat::Json);
//! ```

mod logging;

pub use logging::{default_filter, init_logging, LogFormat};
