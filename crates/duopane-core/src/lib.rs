//! Core types for the duopane file operation engine.
//!
//! This crate provides the data structures shared between the engine and
//! its callers: operation requests, batch outcomes, the error taxonomy with
//! its classifier, and engine configuration.

mod config;
mod error;
mod outcome;
mod request;

pub use config::{
    EngineConfig, EngineConfigBuilder, EngineConfigBuilderError, DEFAULT_CHANNEL_SIZE,
    DEFAULT_PROGRESS_THRESHOLD,
};
pub use error::{classify, Cause, OperationError, RawError};
pub use outcome::OperationOutcome;
pub use request::{OperationRequest, OperationType};
