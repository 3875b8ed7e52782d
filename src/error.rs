use std::{
    error::Error,
    fmt::{Display, Formatter},
};

use crate::image::{AxisTag, SampleFormat};

/// Why [`open_image`](crate::open_image) or [`open_image_as`](crate::open_image_as) failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenImageError {
    /// The path does not point to a readable file
    NotFound,
    /// The file exists but every backend in the chain rejected it
    UnsupportedFormat,
    /// The file decoded fine, but its samples cannot be bridged to the requested format
    UnsupportedConversion,
}
impl Display for OpenImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("Image file not found or not readable"),
            Self::UnsupportedFormat => f.write_str("No backend could decode the image"),
            Self::UnsupportedConversion => {
                f.write_str("Cannot convert the decoded image to the requested sample format")
            }
        }
    }
}
impl Error for OpenImageError {}

/// Failures of the sample conversion engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvertError {
    /// No conversion rule is defined between the two formats
    UnsupportedConversion {
        from: SampleFormat,
        to: SampleFormat,
    },
    /// A same-format operation was given two different formats
    FormatMismatch {
        expected: SampleFormat,
        found: SampleFormat,
    },
    /// An arithmetic operation was given a non-scalar sample format
    NotRealValued(SampleFormat),
}
impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedConversion { from, to } => {
                f.write_fmt(format_args!("No conversion rule from {from} samples to {to} samples"))
            }
            Self::FormatMismatch { expected, found } => f.write_fmt(format_args!(
                "Sample format mismatch: expected {expected}, found {found}"
            )),
            Self::NotRealValued(format) => f.write_fmt(format_args!(
                "Operation is only defined for real-valued samples, found {format}"
            )),
        }
    }
}
impl Error for ConvertError {}

/// Failures of the stack assembler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackError {
    /// The assembler was given nothing to assemble
    EmptyInput,
    /// Not all inputs share one sample format
    MixedSampleFormats,
    /// A frame's channel count disagrees with the first frame's
    InconsistentChannelCount,
    /// A channel image has the wrong number of dimensions
    InvalidChannelRank,
}
impl Display for StackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => f.write_str("Cannot assemble a stack from an empty input list"),
            Self::MixedSampleFormats => f.write_str("All frames of a stack must share one sample format"),
            Self::InconsistentChannelCount => {
                f.write_str("All frames of a stack must have the same number of channels")
            }
            Self::InvalidChannelRank => {
                f.write_str("Channel images must have exactly the expected number of dimensions")
            }
        }
    }
}
impl Error for StackError {}

#[derive(Clone, Copy, Debug)]
pub struct WriteImageError;
impl Display for WriteImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Failed to write image file")
    }
}
impl Error for WriteImageError {}

/// An axis label that cannot be placed in canonical (X, Y, Channel, Z, Time) order
#[derive(Clone, Copy, Debug)]
pub struct UnsupportedAxisError(pub AxisTag);
impl Display for UnsupportedAxisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Axis {} has no canonical position", self.0))
    }
}
impl Error for UnsupportedAxisError {}

/// The buffer, axis labels, and calibration of an [`ImageStack`](crate::image::ImageStack) disagree
#[derive(Clone, Copy, Debug)]
pub struct InvalidLayoutError;
impl Display for InvalidLayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Invalid image layout")
    }
}
impl Error for InvalidLayoutError {}

/// A single backend's failure to decode a file. Recovered by the acquisition
/// chain and surfaced only inside the aggregate attempt log.
#[derive(Clone, Debug)]
pub struct BackendError(pub &'static str, pub String);
impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{} backend failed: {}", self.0, self.1))
    }
}
impl Error for BackendError {}
