//! Batch loading of image folders
//!
//! Files are enumerated in sorted path order and decoded in parallel; results come back in
//! the same order as the sorted listing regardless of which file finishes first.

use error_stack::{Report, ResultExt};
use ndarray::Axis;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::{
    error::OpenImageError,
    image::{DynPixelData, ImageStack},
    stack,
};

/// Loads every `.tif`/`.tiff` file in a folder, in sorted filename order
pub fn load_tiffs_from_folder(folder: impl AsRef<Path>) -> Result<Vec<ImageStack>, Report<OpenImageError>> {
    let folder = folder.as_ref();
    let folder_str = folder.to_string_lossy().to_string();
    let _span_guard = tracing::debug_span!("load_tiffs_from_folder", folder = folder_str).entered();

    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)
        .change_context(OpenImageError::NotFound)
        .attach_printable_lazy(|| format!("Cannot list {}", folder.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    tracing::debug!("Loading {} images from {}", files.len(), folder.display());

    files.par_iter().map(|path| crate::open_image(path)).collect()
}

/// Loads a folder of `.tif`/`.tiff` frames as one float (X, Y, Channel, Time) stack
///
/// Every frame is coerced to `f32` before stacking. With `normalize` set, each frame is
/// independently rescaled to [0, 1] after assembly. Returns `None` for a folder with no
/// TIFF files in it.
pub fn load_folder_as_stack(
    folder: impl AsRef<Path>,
    normalize: bool,
) -> Result<Option<ImageStack>, Report<OpenImageError>> {
    let frames = load_tiffs_from_folder(folder)?;
    if frames.is_empty() {
        return Ok(None);
    }

    let frames = frames
        .into_iter()
        .map(|frame| {
            frame
                .into_float32()
                .change_context(OpenImageError::UnsupportedConversion)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut stack = stack::stack_frames(&frames)
        .change_context(OpenImageError::UnsupportedFormat)
        .attach_printable("Frames in the folder do not line up into one stack")?;

    if normalize {
        if let DynPixelData::Float32(arr) = stack.data_mut() {
            let count = arr.shape()[3];
            for i in 0..count {
                stack::normalize_to_unit(arr.index_axis_mut(Axis(3), i));
            }
        }
    }
    Ok(Some(stack))
}
