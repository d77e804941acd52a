//! Palette-indexed, bounding-box-cropped, run-length-compressed sprite codec
//! for pixel-art trait groups.
//!
//! A group of sprites shares one frequency-ordered palette. Each sprite is
//! cropped to its opaque bounding box and stored as either a dense linear run
//! stream or sparse per-row opaque runs. Multi-byte integers are big-endian.

pub mod batch;
pub mod bounds;
pub mod common;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod import;
pub mod model;
pub mod palette;
pub mod persist;
pub mod rle;

pub use bounds::{find_bounds, BoundingBox};
pub use common::{Color, PixelGrid};
pub use config::{EncoderConfig, Layout, LogicalScale, PaletteChannels, RleVariant};
pub use decode::decode_group;
pub use encode::{build_group, encode_group, TraitSource};
pub use error::CodecError;
pub use model::{Row, RowRun, Run, Trait, TraitGroup, TraitRuns};
pub use palette::{IndexWidth, Palette};
