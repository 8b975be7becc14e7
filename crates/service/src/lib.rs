//! OTA firmware delivery daemon (`otad`)
//!
//! Wires the store, registry, assignment ledger, event log, and
//! delivery services behind an axum HTTP surface, plus the
//! subprocess-backed firmware compiler.

pub mod compiler;
pub mod config;
pub mod http;

pub use compiler::CommandCompiler;
pub use config::{CompilerConfig, ServiceConfig};
pub use http::{router, AppState};
