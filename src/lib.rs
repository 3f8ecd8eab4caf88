pub mod artifacts;
pub mod batch;
pub mod error;
pub mod features;
pub mod models;
pub mod predictor;
pub mod report;
pub mod scoring;
pub mod tips;

pub use error::{Result, ViralityError};
