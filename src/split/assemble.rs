//! Output document assembly

use std::sync::Arc;

use super::error::AssembleError;
use crate::file::psd::{CanvasInfo, ImageData, LayerRecord, PsdDocument};

/// Build a standalone document from the source canvas and a layer subset
///
/// Canvas attributes are copied as-is, the merged image is a blank plane per
/// channel, and `layers` become the document's only layers in the given order.
pub fn assemble(
    canvas: &CanvasInfo,
    layers: &[Arc<LayerRecord>],
) -> Result<PsdDocument, AssembleError> {
    let too_large = || AssembleError::CanvasTooLarge {
        channels: canvas.channels,
        width: canvas.width,
        height: canvas.height,
    };

    let plane_len = canvas
        .row_bytes()
        .checked_mul(canvas.height as usize)
        .ok_or_else(too_large)?;

    let mut planes = Vec::new();
    planes
        .try_reserve_exact(canvas.channels as usize)
        .map_err(|_| too_large())?;
    for _ in 0..canvas.channels {
        let mut plane = Vec::new();
        plane.try_reserve_exact(plane_len).map_err(|_| too_large())?;
        plane.resize(plane_len, 0u8);
        planes.push(plane);
    }

    Ok(PsdDocument {
        canvas: canvas.clone(),
        resources: canvas
            .resolution
            .map(|res| vec![res.to_resource()])
            .unwrap_or_default(),
        layers: layers.to_vec(),
        global_mask: Vec::new(),
        extra_info: Vec::new(),
        image_data: ImageData::Planes(planes),
    })
}
