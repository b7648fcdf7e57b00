//! Request handlers

pub mod review;
