//! PSD format type definitions
//!
//! Core data structures for reading and writing Adobe Photoshop files.
//! All values use Big-Endian byte order as per PSD specification.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::Encoding;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// PSD file signature
pub const PSD_SIGNATURE: &[u8; 4] = b"8BPS";

/// Signature used by image resources, blend modes and tagged blocks
pub const BIM_SIGNATURE: &[u8; 4] = b"8BIM";

/// PSD color modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ColorMode {
    Bitmap = 0,
    Grayscale = 1,
    Indexed = 2,
    Rgb = 3,
    Cmyk = 4,
    Multichannel = 7,
    Duotone = 8,
    Lab = 9,
}

impl ColorMode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Bitmap),
            1 => Some(Self::Grayscale),
            2 => Some(Self::Indexed),
            3 => Some(Self::Rgb),
            4 => Some(Self::Cmyk),
            7 => Some(Self::Multichannel),
            8 => Some(Self::Duotone),
            9 => Some(Self::Lab),
            _ => None,
        }
    }
}

/// Image data compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    Raw = 0,
    Rle = 1,
    Zip = 2,
    ZipPrediction = 3,
}

impl Compression {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Raw),
            1 => Some(Self::Rle),
            2 => Some(Self::Zip),
            3 => Some(Self::ZipPrediction),
            _ => None,
        }
    }
}

/// PSD file header (26 bytes, Big-Endian)
///
/// Structure:
/// - Signature: 4 bytes ("8BPS")
/// - Version: 2 bytes (1 = PSD, 2 = PSB)
/// - Reserved: 6 bytes (must be zero)
/// - Channels: 2 bytes (1-56)
/// - Height: 4 bytes (1-30000 for PSD, 1-300000 for PSB)
/// - Width: 4 bytes (1-30000 for PSD, 1-300000 for PSB)
/// - Depth: 2 bytes (1, 8, 16, or 32)
/// - Color mode: 2 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsdHeader {
    pub version: u16,
    pub channels: u16,
    pub height: u32,
    pub width: u32,
    pub depth: u16,
    pub color_mode: u16,
}

impl PsdHeader {
    /// Header size in bytes
    pub const SIZE: usize = 26;

    /// Write header to output
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(PSD_SIGNATURE)?;
        w.write_u16::<BigEndian>(self.version)?;
        w.write_all(&[0u8; 6])?; // Reserved
        w.write_u16::<BigEndian>(self.channels)?;
        w.write_u32::<BigEndian>(self.height)?;
        w.write_u32::<BigEndian>(self.width)?;
        w.write_u16::<BigEndian>(self.depth)?;
        w.write_u16::<BigEndian>(self.color_mode)?;
        Ok(())
    }

    /// Read the fields following the signature
    pub fn read_after_signature<R: Read>(r: &mut R) -> io::Result<Self> {
        let version = r.read_u16::<BigEndian>()?;
        let mut reserved = [0u8; 6];
        r.read_exact(&mut reserved)?;
        Ok(Self {
            version,
            channels: r.read_u16::<BigEndian>()?,
            height: r.read_u32::<BigEndian>()?,
            width: r.read_u32::<BigEndian>()?,
            depth: r.read_u16::<BigEndian>()?,
            color_mode: r.read_u16::<BigEndian>()?,
        })
    }
}

/// Layer rectangle (top, left, bottom, right)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerBounds {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

/// Layer record flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerFlags {
    pub transparency_protected: bool,
    pub visible: bool,
    pub obsolete: bool,
    pub has_useful_info: bool,
    pub pixel_data_irrelevant: bool,
    /// Bits 5-7, carried through untouched
    pub reserved: u8,
}

impl LayerFlags {
    pub fn to_byte(self) -> u8 {
        let mut flags = self.reserved & 0xE0;
        if self.transparency_protected {
            flags |= 0x01;
        }
        if !self.visible {
            flags |= 0x02; // Note: bit set = hidden
        }
        if self.obsolete {
            flags |= 0x04;
        }
        if self.has_useful_info {
            flags |= 0x08;
        }
        if self.pixel_data_irrelevant {
            flags |= 0x10;
        }
        flags
    }

    pub fn from_byte(b: u8) -> Self {
        Self {
            transparency_protected: (b & 0x01) != 0,
            visible: (b & 0x02) == 0, // Note: bit clear = visible
            obsolete: (b & 0x04) != 0,
            has_useful_info: (b & 0x08) != 0,
            pixel_data_irrelevant: (b & 0x10) != 0,
            reserved: b & 0xE0,
        }
    }
}

/// One channel of a layer, payload kept exactly as stored
///
/// `data` starts with the 2-byte compression marker followed by the
/// (possibly compressed) pixel rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelData {
    /// Channel ID: -1=transparency, -2=user mask, 0.. = color channels
    pub id: i16,
    pub data: Arc<[u8]>,
}

impl ChannelData {
    /// Size of channel info entry in a layer record (2 + 4 = 6 bytes)
    pub const INFO_SIZE: usize = 6;

    pub fn write_info<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_i16::<BigEndian>(self.id)?;
        w.write_u32::<BigEndian>(self.data.len() as u32)?;
        Ok(())
    }
}

/// Additional layer information block (`8BIM` / `8B64` + key + data)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedBlock {
    pub signature: [u8; 4],
    pub key: [u8; 4],
    pub data: Vec<u8>,
}

impl TaggedBlock {
    pub fn new(key: [u8; 4], data: Vec<u8>) -> Self {
        Self {
            signature: *BIM_SIGNATURE,
            key,
            data,
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.signature)?;
        w.write_all(&self.key)?;
        w.write_u32::<BigEndian>(self.data.len() as u32)?;
        w.write_all(&self.data)?;
        Ok(())
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        12 + self.data.len()
    }
}

/// Section divider type stored in an `lsct`/`lsdk` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SectionType {
    Layer = 0,
    OpenFolder = 1,
    ClosedFolder = 2,
    BoundingDivider = 3,
}

impl SectionType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Layer),
            1 => Some(Self::OpenFolder),
            2 => Some(Self::ClosedFolder),
            3 => Some(Self::BoundingDivider),
            _ => None,
        }
    }
}

/// A layer record together with its channel payloads
///
/// Everything the splitter does not look at is stored verbatim so the record
/// can be written back without change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRecord {
    /// Decoded display name (`luni` if present, else the legacy Pascal name)
    pub name: String,
    /// Pascal name bytes as stored in the file
    pub legacy_name: Vec<u8>,
    pub bounds: LayerBounds,
    pub channels: Vec<ChannelData>,
    pub blend_mode: [u8; 4],
    pub opacity: u8,
    pub clipping: u8,
    pub flags: LayerFlags,
    pub mask_data: Vec<u8>,
    pub blending_ranges: Vec<u8>,
    pub additional: Vec<TaggedBlock>,
}

impl LayerRecord {
    /// Create an empty, visible, normal-blend record named `name`
    ///
    /// The legacy name is encoded with `encoding` and a `luni` block is added
    /// so the full Unicode name survives.
    pub fn new(name: &str, encoding: &'static Encoding) -> Self {
        let (legacy, _, _) = encoding.encode(name);
        let mut legacy_name = legacy.into_owned();
        legacy_name.truncate(255);

        Self {
            name: name.to_string(),
            legacy_name,
            bounds: LayerBounds::default(),
            channels: Vec::new(),
            blend_mode: *b"norm",
            opacity: 255,
            clipping: 0,
            flags: LayerFlags {
                visible: true,
                ..Default::default()
            },
            mask_data: Vec::new(),
            blending_ranges: Vec::new(),
            additional: vec![TaggedBlock::new(*b"luni", encode_unicode_name(name))],
        }
    }

    /// Attach a section divider block of the given type
    pub fn with_section(mut self, section: SectionType) -> Self {
        self.additional
            .retain(|block| &block.key != b"lsct" && &block.key != b"lsdk");
        self.additional.push(TaggedBlock::new(
            *b"lsct",
            (section as u32).to_be_bytes().to_vec(),
        ));
        self
    }

    pub fn visible(&self) -> bool {
        self.flags.visible
    }

    /// Raw section divider type, if the record carries an `lsct`/`lsdk` block
    pub fn section_type(&self) -> Option<u32> {
        self.additional
            .iter()
            .find(|block| &block.key == b"lsct" || &block.key == b"lsdk")
            .and_then(|block| block.data.get(0..4))
            .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Find an additional info block by key
    pub fn block(&self, key: &[u8; 4]) -> Option<&TaggedBlock> {
        self.additional.iter().find(|block| &block.key == key)
    }
}

/// Encode a `luni` payload: u32 character count + UTF-16BE code units
pub fn encode_unicode_name(name: &str) -> Vec<u8> {
    let units: Vec<u16> = name.encode_utf16().collect();
    let mut data = Vec::with_capacity(4 + units.len() * 2);
    data.extend_from_slice(&(units.len() as u32).to_be_bytes());
    for unit in units {
        data.extend_from_slice(&unit.to_be_bytes());
    }
    data
}

/// Decode a `luni` payload, `None` when truncated or not valid UTF-16
pub fn decode_unicode_name(data: &[u8]) -> Option<String> {
    let count = u32::from_be_bytes(data.get(0..4)?.try_into().ok()?) as usize;
    let chars = data.get(4..4 + count * 2)?;
    let units: Vec<u16> = chars
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let name = String::from_utf16(&units).ok()?;
    // Some writers include a trailing NUL in the count
    Some(name.trim_end_matches('\0').to_string())
}

/// Image resource IDs
#[derive(Debug, Clone, Copy)]
#[repr(u16)]
pub enum ImageResourceId {
    ResolutionInfo = 0x03ED,
}

/// A raw image resource block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    /// Usually `8BIM`; older tools wrote other signatures
    pub signature: [u8; 4],
    pub id: u16,
    /// Pascal name bytes (without length byte or padding)
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

impl ImageResource {
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        // Resource signature
        w.write_all(&self.signature)?;

        // Resource ID
        w.write_u16::<BigEndian>(self.id)?;

        // Pascal string (name), padded to even
        let name_len = self.name.len().min(255);
        w.write_u8(name_len as u8)?;
        w.write_all(&self.name[..name_len])?;
        if (1 + name_len) % 2 != 0 {
            w.write_u8(0)?;
        }

        // Data length
        w.write_u32::<BigEndian>(self.data.len() as u32)?;

        // Data
        w.write_all(&self.data)?;

        // Pad to even length
        if self.data.len() % 2 != 0 {
            w.write_u8(0)?;
        }

        Ok(())
    }
}

/// Resolution info resource (0x03ED)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionInfo {
    /// Horizontal resolution in pixels per inch (fixed point 16.16)
    pub h_res: u32,
    /// Display unit for h_res (1 = pixels/inch, 2 = pixels/cm)
    pub h_res_unit: u16,
    /// Width unit (1 = inches, 2 = cm, 3 = points, 4 = picas, 5 = columns)
    pub width_unit: u16,
    /// Vertical resolution in pixels per inch (fixed point 16.16)
    pub v_res: u32,
    /// Display unit for v_res
    pub v_res_unit: u16,
    /// Height unit
    pub height_unit: u16,
}

impl ResolutionInfo {
    /// Size in bytes
    pub const SIZE: usize = 16;

    /// Create resolution info with DPI
    pub fn new(dpi: u32) -> Self {
        Self {
            h_res: dpi << 16, // Fixed point 16.16
            h_res_unit: 1,    // pixels/inch
            width_unit: 1,    // inches
            v_res: dpi << 16,
            v_res_unit: 1,
            height_unit: 1,
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<BigEndian>(self.h_res)?;
        w.write_u16::<BigEndian>(self.h_res_unit)?;
        w.write_u16::<BigEndian>(self.width_unit)?;
        w.write_u32::<BigEndian>(self.v_res)?;
        w.write_u16::<BigEndian>(self.v_res_unit)?;
        w.write_u16::<BigEndian>(self.height_unit)?;
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            h_res: r.read_u32::<BigEndian>()?,
            h_res_unit: r.read_u16::<BigEndian>()?,
            width_unit: r.read_u16::<BigEndian>()?,
            v_res: r.read_u32::<BigEndian>()?,
            v_res_unit: r.read_u16::<BigEndian>()?,
            height_unit: r.read_u16::<BigEndian>()?,
        })
    }

    pub fn to_resource(self) -> ImageResource {
        let mut data = Vec::with_capacity(Self::SIZE);
        data.extend_from_slice(&self.h_res.to_be_bytes());
        data.extend_from_slice(&self.h_res_unit.to_be_bytes());
        data.extend_from_slice(&self.width_unit.to_be_bytes());
        data.extend_from_slice(&self.v_res.to_be_bytes());
        data.extend_from_slice(&self.v_res_unit.to_be_bytes());
        data.extend_from_slice(&self.height_unit.to_be_bytes());
        ImageResource {
            signature: *BIM_SIGNATURE,
            id: ImageResourceId::ResolutionInfo as u16,
            name: Vec::new(),
            data,
        }
    }
}

/// Document-wide attributes shared by every layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasInfo {
    pub channels: u16,
    pub color_mode: u16,
    pub depth: u16,
    pub height: u32,
    pub width: u32,
    /// Compression of the base (merged) image data
    pub compression: u16,
    pub resolution: Option<ResolutionInfo>,
    /// Color mode data section (palette for indexed, curves for duotone)
    pub color_mode_data: Vec<u8>,
    /// Negative layer count: first alpha channel is the merged transparency
    pub merged_alpha: bool,
}

impl CanvasInfo {
    /// Bytes per row of one base image plane
    pub fn row_bytes(&self) -> usize {
        let width = self.width as usize;
        match self.depth {
            1 => width.div_ceil(8),
            16 => width.saturating_mul(2),
            32 => width.saturating_mul(4),
            _ => width,
        }
    }

    pub fn header(&self) -> PsdHeader {
        PsdHeader {
            version: 1,
            channels: self.channels,
            height: self.height,
            width: self.width,
            depth: self.depth,
            color_mode: self.color_mode,
        }
    }
}

/// Base (merged) image data of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    /// Image data section exactly as loaded (compression marker included)
    Encoded(Arc<[u8]>),
    /// One uncompressed plane per channel, encoded on save
    Planes(Vec<Vec<u8>>),
}

/// An in-memory layered document
#[derive(Debug, Clone)]
pub struct PsdDocument {
    pub canvas: CanvasInfo,
    /// Image resources in file order
    pub resources: Vec<ImageResource>,
    /// Layer records in storage order (bottom-most first)
    pub layers: Vec<Arc<LayerRecord>>,
    pub global_mask: Vec<u8>,
    /// Document-level additional layer information (excluding Lr16/Lr32)
    pub extra_info: Vec<TaggedBlock>,
    pub image_data: ImageData,
}
