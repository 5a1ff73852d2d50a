pub mod config;
pub mod logging;

pub mod codec;
pub mod control;
pub mod error;
pub mod extractor;
pub mod format;
pub mod job;
pub mod options;
pub mod process;
pub mod transcode;
pub mod workflow;

pub use error::WorkflowError;
