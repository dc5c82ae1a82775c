//! Layer section classification

use crate::file::psd::{LayerRecord, SectionType};

/// Role of a layer record in the folder structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Ordinary pixel layer
    Normal,
    /// Group header of an expanded folder
    FolderOpen,
    /// Group header of a collapsed folder
    FolderClose,
    /// Hidden bounding record that ends a group in front-to-back order
    SectionDivider,
}

impl SectionKind {
    /// Folder header, either open or collapsed
    pub fn is_folder(self) -> bool {
        matches!(self, SectionKind::FolderOpen | SectionKind::FolderClose)
    }

    /// Any record that describes structure instead of content
    pub fn is_marker(self) -> bool {
        self != SectionKind::Normal
    }
}

/// Classify a record by its `lsct`/`lsdk` block
///
/// Records without section metadata, or with an unknown section type, are
/// `Normal`.
pub fn classify(record: &LayerRecord) -> SectionKind {
    match record.section_type().and_then(SectionType::from_u32) {
        Some(SectionType::OpenFolder) => SectionKind::FolderOpen,
        Some(SectionType::ClosedFolder) => SectionKind::FolderClose,
        Some(SectionType::BoundingDivider) => SectionKind::SectionDivider,
        Some(SectionType::Layer) | None => SectionKind::Normal,
    }
}
