// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `BillSight` Providers
//!
//! The static registry of vision model endpoints.
//!
//! | Name | Service | Model | Role |
//! |------|---------|-------|------|
//! | `openrouter_gemini` | OpenRouter | `google/gemini-2.5-flash` | Primary |
//! | `groq_llama_scout` | Groq | `meta-llama/llama-4-scout-17b-16e-instruct` | Fallback |
//! | `openrouter_llama_vision` | OpenRouter | `meta-llama/llama-3.2-11b-vision-instruct:free` | Alternative |
//! | `openrouter_qwen` | OpenRouter | `qwen/qwen-2-vl-7b-instruct:free` | Alternative |
//!
//! ## Usage
//!
//! ```ignore
//! use billsight_providers::build_manager;
//!
//! let manager = build_manager("openrouter_gemini", Some("groq_llama_scout"), timeout)?;
//! ```

pub mod config;
pub mod registry;
pub mod service;
pub mod setup;

mod groq;
mod openrouter;

pub use config::{ProviderConfig, ProviderConfigBuilder, Role, SpeedTier};
pub use registry::ProviderRegistry;
pub use service::Service;
pub use setup::build_manager;
