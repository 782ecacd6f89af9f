//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! main.rs: --config → load + validate → logging
//!     → startup.rs: metrics exporter → price client → bind listener → serve
//!     → signals.rs: SIGINT/SIGTERM → Shutdown::trigger
//!     → shutdown.rs: broadcast → server stops accepting, drains in-flight lookups
//! ```
//!
//! Breakers live as long as the server's `AppState`; nothing is persisted
//! across restarts.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
