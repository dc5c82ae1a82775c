//! Split error types

use thiserror::Error;

/// Malformed group nesting in the layer records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("folder record '{name}' at layer record {position} has no open group to close")]
    UnmatchedFolderMarker { position: usize, name: String },

    #[error("group opened by divider at layer record {position} is never closed ({depth} group(s) left open)")]
    UnclosedGroup { position: usize, depth: usize },
}

/// Failure to build an output document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("canvas {width}x{height} with {channels} channels is too large to allocate")]
    CanvasTooLarge {
        channels: u16,
        width: u32,
        height: u32,
    },
}
