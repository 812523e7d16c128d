//! Input tables, result export, and the input cache.

pub mod cache;
pub mod export;
pub mod import;

pub use cache::InputCache;
