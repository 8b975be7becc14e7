//! Convenience re-exports for downstream crates

pub use crate::api::{
    AssignRequest, AssignResponse, CompileRequest, CompileResponse, EventLogged, EventReport,
    PollResponse,
};
pub use crate::domain::{BuildId, DeviceId, DomainError};
