//! Domain types and contracts

pub mod error;
pub mod review;
pub mod stream;

pub use error::DomainError;
pub use review::{ContentSource, ReviewMode};
pub use stream::{ByteStream, CompletionProvider, StreamEvent};
