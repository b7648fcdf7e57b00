//! AI completion providers

mod cerebras;

pub use cerebras::CerebrasProvider;
