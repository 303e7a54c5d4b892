//! Zero-shot categorization: label embeddings and nearest-category matching.

pub mod categorizer;
pub mod category;

pub use categorizer::{argmax_first, Categorizer};
pub use category::{Category, CategorySet, CACHE_FILENAME};
