//! Search service implementations.

mod tavily;

pub use tavily::{TavilySearcher, TAVILY_API_URL};
