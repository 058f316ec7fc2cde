//! Request/response boundary of the broker

pub mod handler;
pub mod routes;

pub use handler::{NegotiateRequest, NegotiateResponse, RequestHandler, ResetRequest, ResetResponse};
pub use routes::{router, serve};
