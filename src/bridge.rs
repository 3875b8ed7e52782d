//! Bridges a decoded image to a caller-requested sample format
//!
//! This sits between the acquisition chain and [`open_image_as`](crate::open_image_as):
//! scalar formats convert through the rule table, 8-bit images fuse or broadcast into packed
//! RGBA, and packed RGBA decomposes into a synthesized channel axis. Pairs outside those
//! three families fail with [`OpenImageError::UnsupportedConversion`].

use error_stack::{report, Report, ResultExt};
use ndarray::{ArrayD, Axis, Dimension, IxDyn};

use crate::{
    convert,
    error::OpenImageError,
    image::{rgba, AxisTag, DynPixelData, ImageStack, SampleFormat},
};

pub(crate) fn bridge_to_format(
    stack: ImageStack,
    want: SampleFormat,
) -> Result<ImageStack, Report<OpenImageError>> {
    let have = stack.sample_format();
    if have == want {
        return Ok(stack);
    }
    if have.is_real() && want.is_real() {
        let (data, axes, calibration) = stack.into_parts();
        let mut dest = DynPixelData::zeros(want, data.shape());
        convert::convert_and_copy(&data, &mut dest)
            .change_context(OpenImageError::UnsupportedConversion)?;
        return Ok(ImageStack::from_parts(dest, axes, calibration));
    }
    if have == SampleFormat::UInt8 && want == SampleFormat::Rgba {
        return fuse_to_rgba(stack);
    }
    if have == SampleFormat::Rgba && want.is_real() {
        return decompose_rgba(stack, want);
    }
    Err(report!(OpenImageError::UnsupportedConversion))
        .attach_printable(format!("No pixel-type bridge from {have} to {want}"))
}

/// Packs 8-bit samples into RGBA: a 3- or 4-extent channel axis is fused into the packed
/// sample, anything else is broadcast as gray with full alpha
fn fuse_to_rgba(stack: ImageStack) -> Result<ImageStack, Report<OpenImageError>> {
    let (data, axes, calibration) = stack.into_parts();
    let DynPixelData::UInt8(arr) = data else {
        return Err(report!(OpenImageError::UnsupportedConversion))
            .attach_printable("Only UInt8 samples can be packed into RGBA");
    };

    let channel_dim = axes.iter().position(|&tag| tag == AxisTag::Channel);
    match channel_dim {
        Some(dim) if arr.shape()[dim] == 3 || arr.shape()[dim] == 4 => {
            let extent = arr.shape()[dim];
            let planes: Vec<_> = (0..extent).map(|c| arr.index_axis(Axis(dim), c)).collect();

            let mut out = ArrayD::<u32>::zeros(planes[0].raw_dim());
            for (index, sample) in out.indexed_iter_mut() {
                let i = index.slice();
                let alpha = if extent == 4 { planes[3][i] } else { 255 };
                *sample = rgba::pack(planes[0][i], planes[1][i], planes[2][i], alpha);
            }

            let out_axes = axes
                .iter()
                .enumerate()
                .filter(|&(d, _)| d != dim)
                .map(|(_, &tag)| tag)
                .collect();
            let out_calibration = calibration
                .iter()
                .enumerate()
                .filter(|&(d, _)| d != dim)
                .map(|(_, &cal)| cal)
                .collect();
            Ok(ImageStack::from_parts(
                DynPixelData::Rgba(out),
                out_axes,
                out_calibration,
            ))
        }
        _ => {
            let out = arr.mapv(|v| rgba::pack(v, v, v, 255));
            Ok(ImageStack::from_parts(DynPixelData::Rgba(out), axes, calibration))
        }
    }
}

/// Unpacks RGBA samples into a synthesized 4-extent channel axis of the requested scalar type
///
/// `Int8` is not a valid target: components span 0..=255 and do not fit in an `i8`.
fn decompose_rgba(
    stack: ImageStack,
    want: SampleFormat,
) -> Result<ImageStack, Report<OpenImageError>> {
    let (data, mut axes, mut calibration) = stack.into_parts();
    let DynPixelData::Rgba(arr) = data else {
        return Err(report!(OpenImageError::UnsupportedConversion))
            .attach_printable("Only packed RGBA samples can be decomposed into channels");
    };
    if axes.contains(&AxisTag::Channel) {
        return Err(report!(OpenImageError::UnsupportedConversion))
            .attach_printable("Packed samples that already carry a channel axis cannot be decomposed");
    }

    let rank = arr.ndim();
    let mut out_shape = arr.shape().to_vec();
    out_shape.push(4);

    macro_rules! decompose {
        ($t:ty, $variant:ident) => {{
            let mut out = ArrayD::<$t>::zeros(IxDyn(&out_shape));
            for (index, sample) in out.indexed_iter_mut() {
                let coords = index.slice();
                let packed = arr[&coords[..rank]];
                let component = match coords[rank] {
                    0 => rgba::red(packed),
                    1 => rgba::green(packed),
                    2 => rgba::blue(packed),
                    _ => rgba::alpha(packed),
                };
                *sample = component as $t;
            }
            DynPixelData::$variant(out)
        }};
    }

    let data = match want {
        SampleFormat::UInt8 => decompose!(u8, UInt8),
        SampleFormat::UInt16 => decompose!(u16, UInt16),
        SampleFormat::UInt32 => decompose!(u32, UInt32),
        SampleFormat::Int16 => decompose!(i16, Int16),
        SampleFormat::Int32 => decompose!(i32, Int32),
        SampleFormat::Float32 => decompose!(f32, Float32),
        SampleFormat::Float64 => decompose!(f64, Float64),
        // i8 cannot hold an 8-bit component
        SampleFormat::Int8 | SampleFormat::Rgba => {
            return Err(report!(OpenImageError::UnsupportedConversion))
                .attach_printable(format!("No pixel-type bridge from Rgba to {want}"))
        }
    };

    axes.push(AxisTag::Channel);
    calibration.push(1.0);
    Ok(ImageStack::from_parts(data, axes, calibration))
}
