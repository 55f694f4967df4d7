pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod script;
pub mod synth;
pub mod timing;
pub mod transcribe;

pub use error::{DubError, TimingError};
