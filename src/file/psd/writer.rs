//! PSD file writer
//!
//! Writes a [`PsdDocument`] back to disk. Layer records and their channel
//! payloads are emitted exactly as they were loaded.

use super::compression::encode_plane;
use super::types::{
    CanvasInfo, Compression, ImageData, ImageResource, LayerRecord, PsdDocument, TaggedBlock,
    BIM_SIGNATURE,
};
use crate::file::types::CodecError;
use byteorder::{BigEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Save a document to a PSD file
pub fn save_psd(path: &Path, doc: &PsdDocument) -> Result<(), CodecError> {
    tracing::info!("Saving PSD file: {:?}", path);

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_psd(&mut writer, doc)?;
    writer.flush()?;

    tracing::debug!("PSD file saved successfully");
    Ok(())
}

/// Write a document to any byte sink
pub fn write_psd<W: Write>(w: &mut W, doc: &PsdDocument) -> Result<(), CodecError> {
    let canvas = &doc.canvas;

    // 1. File Header
    canvas.header().write(w)?;

    // 2. Color Mode Data
    w.write_u32::<BigEndian>(canvas.color_mode_data.len() as u32)?;
    w.write_all(&canvas.color_mode_data)?;

    // 3. Image Resources
    write_image_resources(w, &doc.resources)?;

    // 4. Layer and Mask Information
    write_layer_section(w, doc)?;

    // 5. Image Data (composite/merged image)
    match &doc.image_data {
        ImageData::Encoded(bytes) => w.write_all(bytes)?,
        ImageData::Planes(planes) => write_planes(w, canvas, planes)?,
    }

    Ok(())
}

/// Write Image Resources section
fn write_image_resources<W: Write>(
    w: &mut W,
    resources: &[ImageResource],
) -> Result<(), CodecError> {
    let mut buffer = Vec::new();
    for resource in resources {
        resource.write(&mut buffer)?;
    }

    // Write section length and data
    w.write_u32::<BigEndian>(buffer.len() as u32)?;
    w.write_all(&buffer)?;

    Ok(())
}

/// Write Layer and Mask Information section
fn write_layer_section<W: Write>(w: &mut W, doc: &PsdDocument) -> Result<(), CodecError> {
    let layer_info = build_layer_info(&doc.layers, doc.canvas.merged_alpha)?;

    // 16/32-bit documents keep their layers in an Lr16/Lr32 block
    let high_depth_key = match doc.canvas.depth {
        16 => Some(*b"Lr16"),
        32 => Some(*b"Lr32"),
        _ => None,
    };

    let mut section = Vec::new();
    match high_depth_key {
        Some(key) if !layer_info.is_empty() => {
            section.write_u32::<BigEndian>(0)?;
            write_global_mask(&mut section, &doc.global_mask)?;
            TaggedBlock::new(key, layer_info).write(&mut section)?;
        }
        _ => {
            section.write_u32::<BigEndian>(layer_info.len() as u32)?;
            section.write_all(&layer_info)?;
            write_global_mask(&mut section, &doc.global_mask)?;
        }
    }

    for block in &doc.extra_info {
        block.write(&mut section)?;
    }

    if doc.layers.is_empty() && doc.global_mask.is_empty() && doc.extra_info.is_empty() {
        // Empty layer section
        w.write_u32::<BigEndian>(0)?;
        return Ok(());
    }

    w.write_u32::<BigEndian>(section.len() as u32)?;
    w.write_all(&section)?;

    Ok(())
}

fn write_global_mask<W: Write>(w: &mut W, mask: &[u8]) -> Result<(), CodecError> {
    w.write_u32::<BigEndian>(mask.len() as u32)?;
    w.write_all(mask)?;
    Ok(())
}

/// Build the layer info structure, padded to a multiple of 4
fn build_layer_info(
    layers: &[Arc<LayerRecord>],
    merged_alpha: bool,
) -> Result<Vec<u8>, CodecError> {
    if layers.is_empty() {
        return Ok(Vec::new());
    }

    let count = i16::try_from(layers.len()).map_err(|_| {
        CodecError::InvalidFormat(format!("too many layers: {}", layers.len()))
    })?;

    let mut layer_info = Vec::new();

    // Layer count (negative = has alpha channel in merged result)
    layer_info.write_i16::<BigEndian>(if merged_alpha { -count } else { count })?;

    // Write all layer records
    for layer in layers {
        write_layer_record(&mut layer_info, layer)?;
    }

    // Write channel image data for all layers
    for layer in layers {
        for channel in &layer.channels {
            layer_info.write_all(&channel.data)?;
        }
    }

    // Pad Layer Info to multiple of 4
    while layer_info.len() % 4 != 0 {
        layer_info.push(0);
    }

    Ok(layer_info)
}

/// Write a single layer record
fn write_layer_record<W: Write>(w: &mut W, layer: &LayerRecord) -> Result<(), CodecError> {
    // Bounds
    w.write_i32::<BigEndian>(layer.bounds.top)?;
    w.write_i32::<BigEndian>(layer.bounds.left)?;
    w.write_i32::<BigEndian>(layer.bounds.bottom)?;
    w.write_i32::<BigEndian>(layer.bounds.right)?;

    // Number of channels
    w.write_u16::<BigEndian>(layer.channels.len() as u16)?;

    // Channel info
    for channel in &layer.channels {
        channel.write_info(w)?;
    }

    // Blend mode signature
    w.write_all(BIM_SIGNATURE)?;

    // Blend mode key
    w.write_all(&layer.blend_mode)?;

    w.write_u8(layer.opacity)?;
    w.write_u8(layer.clipping)?;
    w.write_u8(layer.flags.to_byte())?;

    // Filler
    w.write_u8(0)?;

    // Extra data length
    let extra_data = build_extra_data(layer)?;
    w.write_u32::<BigEndian>(extra_data.len() as u32)?;

    // Extra data
    w.write_all(&extra_data)?;

    Ok(())
}

/// Build extra data for layer record
fn build_extra_data(layer: &LayerRecord) -> Result<Vec<u8>, CodecError> {
    let mut extra = Vec::new();

    extra.write_u32::<BigEndian>(layer.mask_data.len() as u32)?;
    extra.write_all(&layer.mask_data)?;

    extra.write_u32::<BigEndian>(layer.blending_ranges.len() as u32)?;
    extra.write_all(&layer.blending_ranges)?;

    // Layer name (Pascal string, padded to 4 bytes)
    write_pascal_string(&mut extra, &layer.legacy_name)?;

    for block in &layer.additional {
        block.write(&mut extra)?;
    }

    Ok(extra)
}

/// Write Pascal string padded to 4 bytes
fn write_pascal_string<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), CodecError> {
    let len = bytes.len().min(255);

    // Length byte + string bytes
    let total = 1 + len;

    // Pad to multiple of 4
    let padded_len = (total + 3) & !3;

    w.write_u8(len as u8)?;
    w.write_all(&bytes[..len])?;

    // Write padding
    for _ in total..padded_len {
        w.write_u8(0)?;
    }

    Ok(())
}

/// Encode uncompressed base planes with the canvas compression
fn write_planes<W: Write>(
    w: &mut W,
    canvas: &CanvasInfo,
    planes: &[Vec<u8>],
) -> Result<(), CodecError> {
    let row_bytes = canvas.row_bytes();
    let expected = row_bytes * canvas.height as usize;
    if planes.len() != canvas.channels as usize || planes.iter().any(|p| p.len() != expected) {
        return Err(CodecError::InvalidFormat(format!(
            "base image needs {} planes of {} bytes",
            canvas.channels, expected
        )));
    }

    let compression = match Compression::from_u16(canvas.compression) {
        Some(Compression::Raw) => Compression::Raw,
        Some(Compression::Rle) => Compression::Rle,
        other => {
            tracing::warn!(
                "Base image compression {:?} ({}) not supported for writing, using RLE",
                other,
                canvas.compression
            );
            Compression::Rle
        }
    };

    w.write_u16::<BigEndian>(compression as u16)?;

    match compression {
        Compression::Rle => {
            let mut all_row_counts: Vec<u16> = Vec::new();
            let mut all_channel_data: Vec<u8> = Vec::new();

            for plane in planes {
                let (row_counts, compressed_data) = encode_plane(plane, row_bytes);
                all_row_counts.extend(row_counts);
                all_channel_data.extend(compressed_data);
            }

            // Write all row counts first
            for count in &all_row_counts {
                w.write_u16::<BigEndian>(*count)?;
            }

            // Write all compressed data
            w.write_all(&all_channel_data)?;
        }
        _ => {
            for plane in planes {
                w.write_all(plane)?;
            }
        }
    }

    Ok(())
}
