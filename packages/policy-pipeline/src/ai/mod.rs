//! Text generation backends.

mod gemini;

pub use gemini::GeminiGenerator;
