//! Host APIs used by provider clients.
//!
//! - [`env`] - Credential lookup from the process environment
//! - [`http`] - HTTP client with tracing and bearer authentication

pub mod env;
pub mod http;

pub use env::{mask_secret, read_credential};
pub use http::{HttpClient, ResponseExt};
