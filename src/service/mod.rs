//! Client side of the remote analysis service.

pub mod client;
pub mod error;
pub mod mock;

pub use client::{AnalysisService, ChatReply, DEFAULT_BASE_URL, HttpAnalysisService, UploadDocument};
pub use error::ServiceError;
pub use mock::MockAnalysisService;
