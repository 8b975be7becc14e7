//! Domain models and wire schemas for OpenFleet OTA delivery
//!
//! This crate holds the pure domain types shared by the store, delivery,
//! and service crates. Identifier newtypes enforce validation at
//! construction time; the `api` module carries the request/response
//! shapes exposed over HTTP.
//!
//! No I/O happens here.

pub mod api;
pub mod domain;
pub mod prelude;

pub use api::{
    AssignRequest, AssignResponse, CompileRequest, CompileResponse, EventLogged, EventReport,
    PollResponse,
};
pub use domain::{BuildId, DeviceId, DomainError};
