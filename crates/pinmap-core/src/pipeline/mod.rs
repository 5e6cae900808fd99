//! Photo ingestion pipeline components.
//!
//! This module contains all the stages of the pipeline:
//! - **discovery**: List supported photos in the images directory
//! - **validate**: Size and signature checks before decoding
//! - **decode**: Decode images with a dimension limit and timeout
//! - **orientation**: Normalize EXIF orientation
//! - **thumbnail**: Generate cached fixed-size cover thumbnails
//! - **metadata**: Extract GPS coordinates and capture date
//! - **processor**: Orchestrates a full run

pub mod decode;
pub mod discovery;
pub mod metadata;
pub mod orientation;
pub mod processor;
pub mod thumbnail;
pub mod validate;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::FileDiscovery;
pub use metadata::{ExtractedMetadata, MetadataExtractor};
pub use orientation::Orientation;
pub use processor::Pipeline;
pub use thumbnail::ThumbnailGenerator;
pub use validate::Validator;
