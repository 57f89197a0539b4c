//! Core trait abstractions for the policy pipeline.
//!
//! These traits are the seams between the pipeline and the outside world:
//! search, browser automation, text generation, and progress display.
//! Production implementations live in `search`, `browser`, and `ai`; mocks
//! live in `testing`.

pub mod browser;
pub mod generator;
pub mod progress;
pub mod searcher;
