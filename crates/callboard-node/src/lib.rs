//! # Callboard Node
//!
//! Runs the Callboard real-time pipeline as a service.
//!
//! The node wires a transport, the event bus, the connection manager, and the
//! realtime binding from configuration, then exposes a small HTTP API for
//! checking on them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Callboard Node                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API Layer                    │   │
//! │  │  • Health check                                      │   │
//! │  │  • Connection status and bus counters                │   │
//! │  │  • Recent notifications                              │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                              │                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │                 Real-time Pipeline                   │   │
//! │  │  • Simulated or WebSocket transport                  │   │
//! │  │  • Reconnection with exponential backoff             │   │
//! │  │  • Cache invalidation and notifications              │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run --bin callboard-node -- --api-addr 127.0.0.1:8080
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Router and shared state
//! - [`realtime_api`] - Pipeline status endpoints
//! - [`config`] - Node configuration management
//! - [`observability`] - Structured logging
//! - [`sinks`] - Logging cache and notification sinks
//!
//! ## Example: Creating an AppState
//!
//! ```rust,no_run
//! use callboard_node::api::{create_router, AppState};
//! use callboard_node::config::NodeConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NodeConfig::default();
//! let state = AppState::from_config(&config)?;
//! let app = create_router(state.clone());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod observability;
pub mod realtime_api;
pub mod sinks;
