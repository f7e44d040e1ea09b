//! Client for the external LaTeX recognition web service

mod client;
mod error;
pub mod response;

pub use client::RecognitionClient;
pub use error::RecognitionError;
pub use response::Recognition;
