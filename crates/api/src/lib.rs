//! HTTP API layer for survey-rs.
//!
//! - **Procedures**: named RPC procedures, each tagged public or protected
//! - **Endpoints**: the `/rpc` multiplexer and the `/auth` sign-in flow
//! - **Middleware**: session resolution into request extensions
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod procedure;
pub mod procedures;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, session_middleware};
pub use procedure::{Access, Kind, Procedure, ProcedureContext, ProcedureRouter};

#[cfg(test)]
mod test_support;
