// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `BillSight` Processor
//!
//! The end-to-end workflow that turns a bill image into a stored
//! [`ProcessingRecord`](billsight_core::ProcessingRecord).
//!
//! ```text
//! prepare ─▶ extract (vision) ─▶ quality gate ─▶ summarize (text) ─▶ persist
//! ```
//!
//! Each collaborator sits behind a trait so the workflow can run against
//! mocks:
//!
//! - [`ImagePreparer`] - validation and preprocessing ([`ImageProcessor`])
//! - [`VisionModel`](billsight_fetch::VisionModel) - model endpoints, via the
//!   [`ModelManager`](billsight_fetch::ModelManager)
//! - [`BillRepository`](billsight_store::BillRepository) - persistence
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use billsight_processor::{BillProcessor, ImageProcessor};
//!
//! let processor = BillProcessor::new(manager, Arc::new(ImageProcessor::default()), store);
//! let outcome = processor.process(Path::new("receipt.jpg")).await;
//! ```

pub mod error;
pub mod image_prep;
pub mod pdf;
pub mod processor;
pub mod prompts;

pub use error::{LOW_QUALITY_MESSAGE, ProcessError};
pub use image_prep::{
    DEFAULT_MAX_DIMENSION, DEFAULT_MAX_FILE_SIZE, ImageInfo, ImageMetadata, ImagePreparer,
    ImageProcessor, InputFormat, PreparedImage,
};
pub use pdf::{PdfRasterizer, PdfiumRasterizer};
pub use processor::BillProcessor;
pub use prompts::{extraction_prompt, summary_prompt};
