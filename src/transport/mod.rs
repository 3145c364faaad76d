//! Transport layer
//!
//! The HTTP API decodes requests into task submissions and reads task state
//! back out of the registry. It holds no task state of its own.

pub mod http;

pub use http::{HttpApi, SubmitResponse, PENDING_MESSAGE};
