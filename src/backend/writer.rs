//! The sole write backend: a TIFF encoder
//!
//! Stacks are canonicalized to (X, Y, Channel, Z, Time) order and written one page per
//! (z, t) plane, Z-major, so a plain Z stack round-trips through the multi-page reader.
//! Plain TIFF has no hyperstack metadata; a stack with both Z > 1 and T > 1 comes back
//! from the reader as one flat page axis.

use error_stack::{report, Report, ResultExt};
use ndarray::{ArrayD, Axis};
use std::{
    fs::File,
    io::{BufWriter, Seek, Write},
    path::Path,
};
use tiff::encoder::{colortype, TiffEncoder};

use crate::{
    error::WriteImageError,
    image::{ensure_canonical_order, rgba, DynPixelData, ImageStack},
};

pub(crate) fn save_to_tiff(stack: &ImageStack, path: &Path) -> Result<(), Report<WriteImageError>> {
    let canonical = ensure_canonical_order(stack.clone()).change_context(WriteImageError)?;
    let shape = canonical.shape();
    let (width, height, channels) = (shape[0], shape[1], shape[2]);
    let (depth, timepoints) = (shape[3], shape[4]);

    let file = File::create(path)
        .change_context(WriteImageError)
        .attach_printable_lazy(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).change_context(WriteImageError)?;

    for t in 0..timepoints {
        for z in 0..depth {
            write_plane(&mut encoder, &canonical, z, t, width, height, channels)
                .attach_printable_lazy(|| format!("While encoding plane z={z} t={t}"))?;
        }
    }
    Ok(())
}

/// Gathers one (z, t) plane as a row-major, channel-interleaved scanline buffer
fn plane_samples<T: Clone>(arr: &ArrayD<T>, z: usize, t: usize) -> Vec<T> {
    arr.index_axis(Axis(4), t)
        .index_axis_move(Axis(3), z)
        .permuted_axes(&[1, 0, 2][..])
        .iter()
        .cloned()
        .collect()
}

fn write_plane<W: Write + Seek>(
    encoder: &mut TiffEncoder<W>,
    canonical: &ImageStack,
    z: usize,
    t: usize,
    width: usize,
    height: usize,
    channels: usize,
) -> Result<(), Report<WriteImageError>> {
    let (w, h) = (width as u32, height as u32);

    macro_rules! encode {
        ($arr:expr, $colortype:ty) => {
            encoder
                .write_image::<$colortype>(w, h, &plane_samples($arr, z, t))
                .change_context(WriteImageError)
        };
    }

    match (canonical.data(), channels) {
        (DynPixelData::UInt8(arr), 1) => encode!(arr, colortype::Gray8),
        (DynPixelData::UInt8(arr), 3) => encode!(arr, colortype::RGB8),
        (DynPixelData::UInt8(arr), 4) => encode!(arr, colortype::RGBA8),
        (DynPixelData::UInt16(arr), 1) => encode!(arr, colortype::Gray16),
        (DynPixelData::UInt16(arr), 3) => encode!(arr, colortype::RGB16),
        (DynPixelData::UInt16(arr), 4) => encode!(arr, colortype::RGBA16),
        (DynPixelData::UInt32(arr), 1) => encode!(arr, colortype::Gray32),
        (DynPixelData::Float32(arr), 1) => encode!(arr, colortype::Gray32Float),
        (DynPixelData::Float64(arr), 1) => encode!(arr, colortype::Gray64Float),
        (DynPixelData::Rgba(arr), 1) => {
            let bytes: Vec<u8> = plane_samples(arr, z, t)
                .into_iter()
                .flat_map(|sample| {
                    [
                        rgba::red(sample),
                        rgba::green(sample),
                        rgba::blue(sample),
                        rgba::alpha(sample),
                    ]
                })
                .collect();
            encoder
                .write_image::<colortype::RGBA8>(w, h, &bytes)
                .change_context(WriteImageError)
        }
        (data, channels) => Err(report!(WriteImageError)).attach_printable(format!(
            "Cannot encode {} samples with {channels} channels as TIFF",
            data.sample_format()
        )),
    }
}
