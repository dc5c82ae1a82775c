//! PSD file reader
//!
//! Decodes the canvas metadata and the layer records of a PSD file. Channel
//! payloads, masks, tagged blocks and the merged image are kept as raw bytes;
//! only the fields the splitter needs (name, flags, section type) are decoded.

use super::types::{
    decode_unicode_name, CanvasInfo, ChannelData, ColorMode, ImageData, ImageResource,
    ImageResourceId, LayerBounds, LayerFlags, LayerRecord, PsdDocument, PsdHeader,
    ResolutionInfo, TaggedBlock, BIM_SIGNATURE, PSD_SIGNATURE,
};
use crate::file::types::CodecError;
use byteorder::{BigEndian, ReadBytesExt};
use encoding_rs::Encoding;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

type ByteCursor<'a> = Cursor<&'a [u8]>;

/// Load a PSD file from disk
pub fn load_psd(path: &Path, encoding: &'static Encoding) -> Result<PsdDocument, CodecError> {
    tracing::info!("Loading PSD file: {:?}", path);

    let data = std::fs::read(path)?;
    parse_psd(&data, encoding)
}

/// Read a PSD document from any byte stream
pub fn read_psd<R: Read>(
    mut reader: R,
    encoding: &'static Encoding,
) -> Result<PsdDocument, CodecError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_psd(&data, encoding)
}

/// Parse a complete PSD file held in memory
pub fn parse_psd(data: &[u8], encoding: &'static Encoding) -> Result<PsdDocument, CodecError> {
    let mut cursor = Cursor::new(data);

    // 1. File Header
    let signature = take(&mut cursor, 4, "file header")?;
    if signature != PSD_SIGNATURE {
        let mut found = [0u8; 4];
        found.copy_from_slice(signature);
        return Err(CodecError::InvalidSignature(found));
    }
    let header = PsdHeader::read_after_signature(&mut cursor)
        .map_err(|_| CodecError::UnexpectedEof("file header"))?;
    if header.version != 1 {
        return Err(CodecError::UnsupportedVersion(header.version));
    }

    tracing::debug!(
        "PSD header: {}x{}, {} channels, depth {}, mode {:?}",
        header.width,
        header.height,
        header.channels,
        header.depth,
        ColorMode::from_u16(header.color_mode)
    );

    // 2. Color Mode Data
    let color_mode_data = length_prefixed(&mut cursor, "color mode data")?.to_vec();

    // 3. Image Resources
    let resources = parse_image_resources(length_prefixed(&mut cursor, "image resources")?)?;
    let resolution = resources
        .iter()
        .find(|res| res.id == ImageResourceId::ResolutionInfo as u16)
        .filter(|res| res.data.len() >= ResolutionInfo::SIZE)
        .and_then(|res| ResolutionInfo::read(&mut res.data.as_slice()).ok());

    // 4. Layer and Mask Information
    let layer_section = parse_layer_section(
        length_prefixed(&mut cursor, "layer and mask information")?,
        encoding,
    )?;

    // 5. Image Data (merged image), kept as stored
    let start = cursor.position() as usize;
    let image_bytes = &data[start.min(data.len())..];
    let compression = match image_bytes {
        [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
        _ => {
            tracing::warn!("PSD file has no merged image data");
            0
        }
    };

    tracing::info!("Loaded {} layer records from PSD", layer_section.layers.len());

    Ok(PsdDocument {
        canvas: CanvasInfo {
            channels: header.channels,
            color_mode: header.color_mode,
            depth: header.depth,
            height: header.height,
            width: header.width,
            compression,
            resolution,
            color_mode_data,
            merged_alpha: layer_section.merged_alpha,
        },
        resources,
        layers: layer_section.layers,
        global_mask: layer_section.global_mask,
        extra_info: layer_section.extra_info,
        image_data: ImageData::Encoded(Arc::from(image_bytes)),
    })
}

/// Take the next `len` bytes as a borrowed slice
fn take<'a>(
    cursor: &mut ByteCursor<'a>,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], CodecError> {
    let data: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let end = start
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or(CodecError::UnexpectedEof(what))?;
    cursor.set_position(end as u64);
    Ok(&data[start..end])
}

/// Read a u32 length followed by that many bytes
fn length_prefixed<'a>(
    cursor: &mut ByteCursor<'a>,
    what: &'static str,
) -> Result<&'a [u8], CodecError> {
    let len = cursor
        .read_u32::<BigEndian>()
        .map_err(|_| CodecError::UnexpectedEof(what))?;
    take(cursor, len as usize, what)
}

fn remaining(cursor: &ByteCursor<'_>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}

fn read_key(cursor: &mut ByteCursor<'_>, what: &'static str) -> Result<[u8; 4], CodecError> {
    let mut key = [0u8; 4];
    key.copy_from_slice(take(cursor, 4, what)?);
    Ok(key)
}

fn parse_image_resources(section: &[u8]) -> Result<Vec<ImageResource>, CodecError> {
    let mut cursor = Cursor::new(section);
    let mut resources = Vec::new();

    while remaining(&cursor) >= 12 {
        let signature = read_key(&mut cursor, "image resource")?;
        let id = cursor
            .read_u16::<BigEndian>()
            .map_err(|_| CodecError::UnexpectedEof("image resource"))?;

        // Pascal name, padded to even
        let name_len = take(&mut cursor, 1, "image resource name")?[0] as usize;
        let name = take(&mut cursor, name_len, "image resource name")?.to_vec();
        if (1 + name_len) % 2 != 0 {
            take(&mut cursor, 1, "image resource name")?;
        }

        let data = length_prefixed(&mut cursor, "image resource data")?.to_vec();
        if data.len() % 2 != 0 && remaining(&cursor) > 0 {
            take(&mut cursor, 1, "image resource data")?;
        }

        resources.push(ImageResource {
            signature,
            id,
            name,
            data,
        });
    }

    Ok(resources)
}

/// Contents of the layer and mask information section
struct LayerSection {
    layers: Vec<Arc<LayerRecord>>,
    merged_alpha: bool,
    global_mask: Vec<u8>,
    extra_info: Vec<TaggedBlock>,
}

fn parse_layer_section(
    section: &[u8],
    encoding: &'static Encoding,
) -> Result<LayerSection, CodecError> {
    let mut result = LayerSection {
        layers: Vec::new(),
        merged_alpha: false,
        global_mask: Vec::new(),
        extra_info: Vec::new(),
    };
    if section.is_empty() {
        return Ok(result);
    }

    let mut cursor = Cursor::new(section);

    let layer_info = length_prefixed(&mut cursor, "layer info")?;
    if !layer_info.is_empty() {
        let (layers, merged_alpha) = parse_layer_info(layer_info, encoding)?;
        result.layers = layers;
        result.merged_alpha = merged_alpha;
    }

    if remaining(&cursor) >= 4 {
        result.global_mask = length_prefixed(&mut cursor, "global layer mask")?.to_vec();
    }

    for block in parse_tagged_blocks(&mut cursor)? {
        let high_depth_layers = &block.key == b"Lr16" || &block.key == b"Lr32";
        if high_depth_layers && result.layers.is_empty() {
            let (layers, merged_alpha) = parse_layer_info(&block.data, encoding)?;
            result.layers = layers;
            result.merged_alpha = merged_alpha;
        } else {
            result.extra_info.push(block);
        }
    }

    Ok(result)
}

/// Parse additional layer information blocks until the data runs out
fn parse_tagged_blocks(cursor: &mut ByteCursor<'_>) -> Result<Vec<TaggedBlock>, CodecError> {
    let mut blocks = Vec::new();

    while remaining(cursor) >= 12 {
        let signature = read_key(cursor, "tagged block")?;
        if &signature != BIM_SIGNATURE && &signature != b"8B64" {
            // Trailing padding
            break;
        }
        let key = read_key(cursor, "tagged block")?;
        let data = length_prefixed(cursor, "tagged block data")?.to_vec();
        blocks.push(TaggedBlock {
            signature,
            key,
            data,
        });
    }

    Ok(blocks)
}

/// Parse a layer info structure: count, records, then channel image data
fn parse_layer_info(
    info: &[u8],
    encoding: &'static Encoding,
) -> Result<(Vec<Arc<LayerRecord>>, bool), CodecError> {
    let mut cursor = Cursor::new(info);

    let count = cursor
        .read_i16::<BigEndian>()
        .map_err(|_| CodecError::UnexpectedEof("layer count"))?;
    let merged_alpha = count < 0;
    let count = count.unsigned_abs() as usize;

    let mut pending = Vec::with_capacity(count);
    for index in 0..count {
        let record = parse_layer_record(&mut cursor, encoding).map_err(|e| match e {
            CodecError::InvalidFormat(msg) => {
                CodecError::InvalidFormat(format!("layer record {}: {}", index, msg))
            }
            other => other,
        })?;
        pending.push(record);
    }

    let mut layers = Vec::with_capacity(count);
    for (mut record, lengths) in pending {
        for (id, len) in lengths {
            let data = take(&mut cursor, len as usize, "channel image data")?;
            record.channels.push(ChannelData {
                id,
                data: Arc::from(data),
            });
        }
        tracing::debug!(
            "Layer '{}': {} channels, visible={}",
            record.name,
            record.channels.len(),
            record.flags.visible
        );
        layers.push(Arc::new(record));
    }

    Ok((layers, merged_alpha))
}

/// Parse one layer record; channel payloads are attached later
fn parse_layer_record(
    cursor: &mut ByteCursor<'_>,
    encoding: &'static Encoding,
) -> Result<(LayerRecord, Vec<(i16, u32)>), CodecError> {
    let eof = |_| CodecError::UnexpectedEof("layer record");

    let bounds = LayerBounds {
        top: cursor.read_i32::<BigEndian>().map_err(eof)?,
        left: cursor.read_i32::<BigEndian>().map_err(eof)?,
        bottom: cursor.read_i32::<BigEndian>().map_err(eof)?,
        right: cursor.read_i32::<BigEndian>().map_err(eof)?,
    };

    let channel_count = cursor.read_u16::<BigEndian>().map_err(eof)?;
    let mut lengths = Vec::with_capacity(channel_count as usize);
    for _ in 0..channel_count {
        let id = cursor.read_i16::<BigEndian>().map_err(eof)?;
        let len = cursor.read_u32::<BigEndian>().map_err(eof)?;
        lengths.push((id, len));
    }

    let signature = read_key(cursor, "layer record")?;
    if &signature != BIM_SIGNATURE {
        return Err(CodecError::InvalidFormat(format!(
            "bad blend mode signature {:?}",
            signature
        )));
    }
    let blend_mode = read_key(cursor, "layer record")?;
    let opacity = cursor.read_u8().map_err(eof)?;
    let clipping = cursor.read_u8().map_err(eof)?;
    let flags = LayerFlags::from_byte(cursor.read_u8().map_err(eof)?);
    let _filler = cursor.read_u8().map_err(eof)?;

    let extra = length_prefixed(cursor, "layer extra data")?;
    let mut extra_cursor = Cursor::new(extra);

    let mask_data = length_prefixed(&mut extra_cursor, "layer mask data")?.to_vec();
    let blending_ranges = length_prefixed(&mut extra_cursor, "layer blending ranges")?.to_vec();

    // Pascal string, padded to a multiple of 4
    let name_len = take(&mut extra_cursor, 1, "layer name")?[0] as usize;
    let legacy_name = take(&mut extra_cursor, name_len, "layer name")?.to_vec();
    let padding = ((1 + name_len + 3) & !3) - (1 + name_len);
    let padding = padding.min(remaining(&extra_cursor));
    take(&mut extra_cursor, padding, "layer name")?;

    let additional = parse_tagged_blocks(&mut extra_cursor)?;

    let name = additional
        .iter()
        .find(|block| &block.key == b"luni")
        .and_then(|block| decode_unicode_name(&block.data))
        .unwrap_or_else(|| {
            let (decoded, _) = encoding.decode_without_bom_handling(&legacy_name);
            decoded.into_owned()
        });

    let record = LayerRecord {
        name,
        legacy_name,
        bounds,
        channels: Vec::with_capacity(lengths.len()),
        blend_mode,
        opacity,
        clipping,
        flags,
        mask_data,
        blending_ranges,
        additional,
    };

    Ok((record, lengths))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_signature() {
        let err = parse_psd(b"GIF89a..........", encoding_rs::UTF_8).unwrap_err();
        assert!(matches!(err, CodecError::InvalidSignature(sig) if &sig == b"GIF8"));
    }

    #[test]
    fn test_rejects_psb() {
        let mut data = Vec::new();
        data.extend_from_slice(b"8BPS");
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 20]);
        let err = parse_psd(&data, encoding_rs::UTF_8).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_truncated_header() {
        let err = parse_psd(b"8BPS\x00\x01", encoding_rs::UTF_8).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEof("file header")));
    }

    #[test]
    fn test_truncated_section() {
        let mut data = Vec::new();
        data.extend_from_slice(b"8BPS");
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 6]);
        data.extend_from_slice(&3u16.to_be_bytes());
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(&4u32.to_be_bytes());
        data.extend_from_slice(&8u16.to_be_bytes());
        data.extend_from_slice(&3u16.to_be_bytes());
        // Color mode data claims 100 bytes but the file ends
        data.extend_from_slice(&100u32.to_be_bytes());
        let err = parse_psd(&data, encoding_rs::UTF_8).unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEof("color mode data")));
    }

    #[test]
    fn test_image_resources_padding() {
        let mut section = Vec::new();
        // 8BIM, id 0x0400, name "ab" (len 2 => 3 bytes, pad 1), data 3 bytes + pad
        section.extend_from_slice(b"8BIM");
        section.extend_from_slice(&0x0400u16.to_be_bytes());
        section.extend_from_slice(&[2, b'a', b'b', 0]);
        section.extend_from_slice(&3u32.to_be_bytes());
        section.extend_from_slice(&[1, 2, 3, 0]);
        let resources = parse_image_resources(&section).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, b"ab");
        assert_eq!(resources[0].data, vec![1, 2, 3]);
    }

    #[test]
    fn test_legacy_name_uses_encoding() {
        // "あい" in Shift_JIS
        let sjis: &[u8] = &[0x82, 0xA0, 0x82, 0xA2];
        let (decoded, _) = encoding_rs::SHIFT_JIS.decode_without_bom_handling(sjis);
        assert_eq!(decoded, "あい");
    }
}
