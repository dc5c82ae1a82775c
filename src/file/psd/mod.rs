//! Adobe Photoshop (.psd) format support
//!
//! Loads and saves PSD files at the layer-record level. Records keep their
//! channel payloads and tagged blocks verbatim, so a record can be moved into
//! another document and written out unchanged.

pub mod compression;
mod reader;
mod types;
mod writer;

pub use reader::{load_psd, parse_psd, read_psd};
pub use types::{
    encode_unicode_name, CanvasInfo, ChannelData, ColorMode, Compression, ImageData,
    ImageResource, LayerBounds, LayerFlags, LayerRecord, PsdDocument, ResolutionInfo,
    SectionType, TaggedBlock,
};
pub use writer::{save_psd, write_psd};
