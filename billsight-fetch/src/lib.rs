// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `BillSight` Fetch
//!
//! Calling vision-language models over OpenAI-compatible HTTP APIs, with a
//! single primary → secondary fallback hop.
//!
//! ## Host APIs
//!
//! - [`host::env`] - Credential lookup from the environment
//! - [`host::http`] - HTTP client with tracing
//!
//! ## Models
//!
//! - [`model::VisionModel`] - Trait for one named model endpoint
//! - [`client::ProviderClient`] - HTTP implementation of [`VisionModel`]
//! - [`manager::ModelManager`] - Primary/fallback orchestration
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use billsight_fetch::{ModelManager, ModelRequest, ProviderClient};
//!
//! let primary = ProviderClient::from_env(primary_endpoint, timeout)?;
//! let manager = ModelManager::new(Arc::new(primary), None);
//!
//! let result = manager.call_with_fallback(&ModelRequest::text("Hello")).await;
//! if result.is_success() {
//!     println!("{} answered", result.model_used.unwrap_or_default());
//! }
//! ```

pub mod client;
pub mod error;
pub mod host;
pub mod manager;
pub mod model;
pub mod wire;


// Errors
pub use error::{ConfigError, ProviderError, ProviderErrorKind};

// Host APIs
pub use host::{HttpClient, mask_secret, read_credential};

// Models & orchestration
pub use client::{Endpoint, ProviderClient};
pub use manager::{CallAttempt, CallResult, ModelManager};
pub use model::{
    CallKind, ImagePayload, ModelRequest, TEXT_MAX_TOKENS, TEXT_TEMPERATURE, VISION_MAX_TOKENS,
    VISION_TEMPERATURE, VisionModel,
};
