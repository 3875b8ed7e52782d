//! A compatibility layer for loading and saving scientific multi-dimensional images
//! (microscopy TIFF stacks, multi-channel and multi-frame datasets) without caring which
//! decoder actually understands the file.
//!
//! Opening an image walks an ordered chain of backends (a native TIFF decoder first, then
//! the `image` crate's multi-format decoder) and returns the first successful decode as an
//! [`ImageStack`]: one typed N-dimensional sample buffer plus a label per axis. Everything
//! downstream of the chain is format-agnostic: the [`convert`] engine copies and converts
//! between sample formats, the [`stack`] assembler builds multi-channel and multi-frame
//! stacks out of individual planes, and [`image::ensure_canonical_order`] rewrites any
//! stack into the fixed (X, Y, Channel, Z, Time) dimension order.
//!
//! ```no_run
//! use stackio::{open_image, save_image};
//!
//! let stack = open_image("cells_t01.tif").expect("readable image");
//! println!("{:?} samples, shape {:?}", stack.sample_format(), stack.shape());
//! save_image(&stack, "cells_copy").expect("writable folder"); // extension defaults to .tif
//! ```

use error_stack::Report;
use std::path::Path;

pub mod error;
use error::{OpenImageError, WriteImageError};

pub mod image;
pub use image::{AxisTag, DynPixelData, ImageStack, SampleFormat};

pub mod convert;
pub mod stack;

mod backend;
mod bridge;

pub mod folder;

/// Opens the image file at `path` with the first backend in the chain that can decode it
///
/// The decoded stack keeps whatever sample format and dimension order the file implied; use
/// [`open_image_as`] to request a specific sample format, and
/// [`image::ensure_canonical_order`] for a fixed dimension order.
pub fn open_image(path: impl AsRef<Path>) -> Result<ImageStack, Report<OpenImageError>> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();
    let _span_guard = tracing::debug_span!("open_image", path = path_str).entered();

    backend::open_with_chain(path)
}

/// Opens the image file at `path` and bridges its samples to the requested format
///
/// Scalar formats convert through the engine's rule table, 8-bit images can be packed into
/// [`SampleFormat::Rgba`], and packed RGBA can be decomposed into a channel axis of any
/// scalar type wide enough for an 8-bit component (every scalar format except
/// [`SampleFormat::Int8`]). Requests outside those families fail with
/// [`OpenImageError::UnsupportedConversion`].
pub fn open_image_as(
    path: impl AsRef<Path>,
    format: SampleFormat,
) -> Result<ImageStack, Report<OpenImageError>> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();
    let _span_guard = tracing::debug_span!("open_image_as", path = path_str, format = %format).entered();

    let decoded = backend::open_with_chain(path)?;
    bridge::bridge_to_format(decoded, format)
}

/// Saves a stack as a (possibly multi-page) TIFF file
///
/// A path without an extension gets `.tif` appended. The stack is canonicalized to
/// (X, Y, Channel, Z, Time) order and written one page per (z, t) plane.
pub fn save_image(stack: &ImageStack, path: impl AsRef<Path>) -> Result<(), Report<WriteImageError>> {
    let path = path.as_ref();
    let path = if path.extension().is_none() {
        path.with_extension("tif")
    } else {
        path.to_path_buf()
    };
    let path_str = path.to_string_lossy().to_string();
    let _span_guard = tracing::debug_span!("save_image", path = path_str).entered();

    backend::writer::save_to_tiff(stack, &path)
}
