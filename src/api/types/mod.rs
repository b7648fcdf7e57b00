//! API wire types

mod error;
mod review;

pub use error::{ApiError, ApiErrorDetail, ApiErrorResponse};
pub use review::{AnalyzeRepoRequestBody, ReviewRequestBody, StreamChoice, StreamDelta, StreamRecord};
