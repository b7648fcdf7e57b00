//! API middleware components

pub mod origin;
pub mod rate_limit;
pub mod security;

pub use origin::origin_gate_middleware;
pub use rate_limit::rate_limit_middleware;
pub use security::security_headers_middleware;
