//! File format support module
//!
//! Provides load/save for:
//! - PSD (.psd) - Adobe Photoshop layered documents, records kept verbatim

pub mod psd;
pub mod types;

pub use types::*;
