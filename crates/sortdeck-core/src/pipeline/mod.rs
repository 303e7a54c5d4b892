//! Categorization phase components.
//!
//! - **discovery**: Find image files in the input folder
//! - **decode**: Load and decode images with size limits
//! - **sorter**: Decode, categorize and copy each image into its bucket

pub mod decode;
pub mod discovery;
pub mod sorter;

pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use sorter::ImageSorter;
