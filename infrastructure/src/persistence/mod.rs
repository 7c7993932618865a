//! Result persistence

mod file_store;
mod markdown;

pub use file_store::FileResultStore;
pub use markdown::MarkdownRenderer;
