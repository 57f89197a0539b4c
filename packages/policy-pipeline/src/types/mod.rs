//! Request-scoped data types for the policy pipeline.

pub mod candidate;
pub mod document;
pub mod policy;
pub mod prompt;
pub mod request;
pub mod stage;
