//! Assembles collections of frame and channel images into one multi-dimensional stack
//!
//! Dimension convention for assembled stacks: (X, Y, Channel, Time) with singleton channel
//! axes kept explicit. The first input sets the reference extents and channel count; later
//! inputs that disagree on channels are an error, while smaller spatial extents read as zero
//! through the copy engine's boundary extension.

use error_stack::{report, Report, ResultExt};
use ndarray::{ArrayD, ArrayViewMutD, Axis, IxDyn};
use num_traits::Zero;

use crate::{
    convert::{compute_min_max, copy, Extended},
    error::StackError,
    image::{AxisTag, DynPixelData, ImageStack},
};

/// Stacks N frame images of one sample format along a trailing frame axis
///
/// Frames may be 2-D (width, height), treated as single-channel, or 3-D
/// (width, height, channels); any higher rank fails with
/// [`StackError::InvalidChannelRank`]. The output is always 4-D
/// (width, height, channels, frames).
pub fn stack_frames(frames: &[ImageStack]) -> Result<ImageStack, Report<StackError>> {
    let first = frames.first().ok_or_else(|| report!(StackError::EmptyInput))?;

    macro_rules! dispatch {
        ($($variant:ident),+) => {
            match first.data() {
                $(DynPixelData::$variant(_) => {
                    let mut typed = Vec::with_capacity(frames.len());
                    for frame in frames {
                        match frame.data() {
                            DynPixelData::$variant(arr) => typed.push(arr),
                            other => {
                                return Err(report!(StackError::MixedSampleFormats))
                                    .attach_printable(format!(
                                        "Frame {} holds {} samples, expected {}",
                                        typed.len(),
                                        other.sample_format(),
                                        first.sample_format()
                                    ))
                            }
                        }
                    }
                    DynPixelData::$variant(stack_frames_typed(&typed)?)
                }),+
            }
        };
    }
    let data = dispatch!(UInt8, Int8, UInt16, Int16, UInt32, Int32, Float32, Float64, Rgba);

    let axes = vec![AxisTag::X, AxisTag::Y, AxisTag::Channel, AxisTag::Time];
    let calibration = vec![1.0; axes.len()];
    Ok(ImageStack::from_parts(data, axes, calibration))
}

fn stack_frames_typed<T: Clone + Zero>(frames: &[&ArrayD<T>]) -> Result<ArrayD<T>, Report<StackError>> {
    let first = frames[0];
    let width = first.shape()[0];
    let height = first.shape().get(1).copied().unwrap_or(1);
    let channels = first.shape().get(2).copied().unwrap_or(1);

    let mut dest = ArrayD::zeros(IxDyn(&[width, height, channels, frames.len()]));
    for (i, frame) in frames.iter().enumerate() {
        if frame.ndim() > 3 {
            return Err(report!(StackError::InvalidChannelRank)).attach_printable(format!(
                "Frame {i} is {}-dimensional, expected at most 3",
                frame.ndim()
            ));
        }
        let frame_channels = frame.shape().get(2).copied().unwrap_or(1);
        if frame_channels != channels {
            return Err(report!(StackError::InconsistentChannelCount)).attach_printable(format!(
                "Frame {i} has {frame_channels} channels, frame 0 has {channels}"
            ));
        }
        let mut frame_slot = dest.index_axis_mut(Axis(3), i);
        for c in 0..channels {
            let mut channel_slot = frame_slot.index_axis_mut(Axis(2), c);
            if frame.ndim() < 3 {
                copy(&Extended::zero(frame.view()), &mut channel_slot);
            } else {
                copy(&Extended::zero(frame.index_axis(Axis(2), c)), &mut channel_slot);
            }
        }
    }
    Ok(dest)
}

/// Fuses N single-channel 2-D float images into one 3-D (width, height, channel) image,
/// rescaling each channel independently to [0, 1]
pub fn make_multi_channel_image(channels: &[ArrayD<f32>]) -> Result<ImageStack, Report<StackError>> {
    let first = channels.first().ok_or_else(|| report!(StackError::EmptyInput))?;
    for (c, channel) in channels.iter().enumerate() {
        if channel.ndim() != 2 {
            return Err(report!(StackError::InvalidChannelRank))
                .attach_printable(format!("Channel {c} is {}-dimensional, expected 2", channel.ndim()));
        }
    }

    let (width, height) = (first.shape()[0], first.shape()[1]);
    let mut dest = ArrayD::<f32>::zeros(IxDyn(&[width, height, channels.len()]));
    for (c, channel) in channels.iter().enumerate() {
        let mut slot = dest.index_axis_mut(Axis(2), c);
        copy(&Extended::zero(channel.view()), &mut slot);
        normalize_to_unit(slot);
    }

    let axes = vec![AxisTag::X, AxisTag::Y, AxisTag::Channel];
    let calibration = vec![1.0; axes.len()];
    Ok(ImageStack::from_parts(DynPixelData::Float32(dest), axes, calibration))
}

/// Stacks N multi-channel 3-D float frames into one 4-D (width, height, channel, time) image
///
/// A frame of any other rank fails with [`StackError::InvalidChannelRank`]; a 3-D frame
/// whose channel count disagrees with the first frame fails with
/// [`StackError::InconsistentChannelCount`]. Each destination plane is normalized before
/// its samples land in it, so callers get the raw frame values.
pub fn make_multi_frame_from_channel_images(frames: &[ArrayD<f32>]) -> Result<ImageStack, Report<StackError>> {
    let first = frames.first().ok_or_else(|| report!(StackError::EmptyInput))?;
    for (i, frame) in frames.iter().enumerate() {
        if frame.ndim() != 3 {
            return Err(report!(StackError::InvalidChannelRank))
                .attach_printable(format!("Frame {i} is {}-dimensional, expected 3", frame.ndim()));
        }
    }
    let channels = first.shape()[2];
    for (i, frame) in frames.iter().enumerate() {
        if frame.shape()[2] != channels {
            return Err(report!(StackError::InconsistentChannelCount)).attach_printable(format!(
                "Frame {i} has {} channels, frame 0 has {channels}",
                frame.shape()[2]
            ));
        }
    }

    let (width, height) = (first.shape()[0], first.shape()[1]);
    let mut dest = ArrayD::<f32>::zeros(IxDyn(&[width, height, channels, frames.len()]));
    for (i, frame) in frames.iter().enumerate() {
        for c in 0..channels {
            let slot = dest.index_axis_mut(Axis(3), i).index_axis_move(Axis(2), c);
            normalize_to_unit(slot);
            let mut slot = dest.index_axis_mut(Axis(3), i).index_axis_move(Axis(2), c);
            copy(&Extended::zero(frame.index_axis(Axis(2), c)), &mut slot);
        }
    }

    let axes = vec![AxisTag::X, AxisTag::Y, AxisTag::Channel, AxisTag::Time];
    let calibration = vec![1.0; axes.len()];
    Ok(ImageStack::from_parts(DynPixelData::Float32(dest), axes, calibration))
}

/// Linearly rescales a float plane to [0, 1] in place
///
/// A constant plane maps to all zeros; an empty plane is left alone.
pub fn normalize_to_unit(mut plane: ArrayViewMutD<'_, f32>) {
    let Some((min, max)) = compute_min_max(plane.iter()) else {
        return;
    };
    if max > min {
        let range = max - min;
        plane.mapv_inplace(|v| (v - min) / range);
    } else {
        plane.fill(0.0);
    }
}
