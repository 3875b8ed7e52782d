use ndarray::{ArrayD, IxDyn};

use super::SampleFormat;
use crate::error::ConvertError;

/// An `enum` wrapper for pixel buffers of all possible [`SampleFormat`]s
///
/// If you know the sample format of a given image, or your program only accepts data of a certain
/// type, you can attempt to convert a `DynPixelData` into that type with
/// `let raw: ArrayD<TYPE> = image.into_data().try_into()?;`
///
/// See also [`SampleFormat`]
#[derive(Clone, Debug, PartialEq)]
pub enum DynPixelData {
    /// Pixel samples are scalar `u8`s
    UInt8(ArrayD<u8>),
    /// Pixel samples are scalar `i8`s
    Int8(ArrayD<i8>),
    /// Pixel samples are scalar `u16`s
    UInt16(ArrayD<u16>),
    /// Pixel samples are scalar `i16`s
    Int16(ArrayD<i16>),
    /// Pixel samples are scalar `u32`s
    UInt32(ArrayD<u32>),
    /// Pixel samples are scalar `i32`s
    Int32(ArrayD<i32>),
    /// Pixel samples are scalar `f32`s
    Float32(ArrayD<f32>),
    /// Pixel samples are scalar `f64`s
    Float64(ArrayD<f64>),
    /// Pixel samples are `u32`s holding packed 8-bit ARGB, laid out as `a<<24 | r<<16 | g<<8 | b`
    Rgba(ArrayD<u32>),
}
impl DynPixelData {
    /// Returns the sample format of this enum variant
    pub fn sample_format(&self) -> SampleFormat {
        match self {
            DynPixelData::UInt8(_) => SampleFormat::UInt8,
            DynPixelData::Int8(_) => SampleFormat::Int8,
            DynPixelData::UInt16(_) => SampleFormat::UInt16,
            DynPixelData::Int16(_) => SampleFormat::Int16,
            DynPixelData::UInt32(_) => SampleFormat::UInt32,
            DynPixelData::Int32(_) => SampleFormat::Int32,
            DynPixelData::Float32(_) => SampleFormat::Float32,
            DynPixelData::Float64(_) => SampleFormat::Float64,
            DynPixelData::Rgba(_) => SampleFormat::Rgba,
        }
    }

    /// Returns the shape of the underlying buffer, one extent per axis
    pub fn shape(&self) -> &[usize] {
        match self {
            DynPixelData::UInt8(arr) => arr.shape(),
            DynPixelData::Int8(arr) => arr.shape(),
            DynPixelData::UInt16(arr) => arr.shape(),
            DynPixelData::Int16(arr) => arr.shape(),
            DynPixelData::UInt32(arr) => arr.shape(),
            DynPixelData::Int32(arr) => arr.shape(),
            DynPixelData::Float32(arr) => arr.shape(),
            DynPixelData::Float64(arr) => arr.shape(),
            DynPixelData::Rgba(arr) => arr.shape(),
        }
    }

    /// Returns the number of axes of the underlying buffer
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Returns the total number of samples in the buffer
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocates a zero-filled buffer of the given format and shape
    pub fn zeros(format: SampleFormat, shape: &[usize]) -> Self {
        let dim = IxDyn(shape);
        match format {
            SampleFormat::UInt8 => DynPixelData::UInt8(ArrayD::zeros(dim)),
            SampleFormat::Int8 => DynPixelData::Int8(ArrayD::zeros(dim)),
            SampleFormat::UInt16 => DynPixelData::UInt16(ArrayD::zeros(dim)),
            SampleFormat::Int16 => DynPixelData::Int16(ArrayD::zeros(dim)),
            SampleFormat::UInt32 => DynPixelData::UInt32(ArrayD::zeros(dim)),
            SampleFormat::Int32 => DynPixelData::Int32(ArrayD::zeros(dim)),
            SampleFormat::Float32 => DynPixelData::Float32(ArrayD::zeros(dim)),
            SampleFormat::Float64 => DynPixelData::Float64(ArrayD::zeros(dim)),
            SampleFormat::Rgba => DynPixelData::Rgba(ArrayD::zeros(dim)),
        }
    }
}

macro_rules! try_into_impl {
    ($enum:ident, $t:ty) => {
        #[doc=concat!("Returns `Ok(ArrayD<", stringify!($t), ">)` for [`", stringify!($enum), "`](Self::", stringify!($enum), ") variants, and a [`ConvertError`] otherwise")]
        impl TryInto<ArrayD<$t>> for DynPixelData {
            type Error = ConvertError;
            fn try_into(self) -> Result<ArrayD<$t>, Self::Error> {
                match self {
                    Self::$enum(raw) => Ok(raw),
                    other => Err(ConvertError::FormatMismatch {
                        expected: SampleFormat::$enum,
                        found: other.sample_format(),
                    }),
                }
            }
        }
    };
}

try_into_impl!(UInt8, u8);
try_into_impl!(Int8, i8);
try_into_impl!(UInt16, u16);
try_into_impl!(Int16, i16);
try_into_impl!(Int32, i32);
try_into_impl!(Float32, f32);
try_into_impl!(Float64, f64);
// UInt32 and Rgba both wrap ArrayD<u32>, so neither can have a blanket
// TryInto/From without overlapping; downcast those two by matching.

macro_rules! from_impl {
    ($enum:ident, $t:ty) => {
        impl From<ArrayD<$t>> for DynPixelData {
            fn from(raw: ArrayD<$t>) -> Self {
                Self::$enum(raw)
            }
        }
    };
}

from_impl!(UInt8, u8);
from_impl!(Int8, i8);
from_impl!(UInt16, u16);
from_impl!(Int16, i16);
from_impl!(Int32, i32);
from_impl!(Float32, f32);
from_impl!(Float64, f64);

/// Applies one expression to whichever typed buffer is inside a [`DynPixelData`],
/// rewrapping the result in the same variant
macro_rules! map_pixel_data {
    ($data:expr, |$arr:ident| $body:expr) => {
        match $data {
            $crate::image::DynPixelData::UInt8($arr) => $crate::image::DynPixelData::UInt8($body),
            $crate::image::DynPixelData::Int8($arr) => $crate::image::DynPixelData::Int8($body),
            $crate::image::DynPixelData::UInt16($arr) => $crate::image::DynPixelData::UInt16($body),
            $crate::image::DynPixelData::Int16($arr) => $crate::image::DynPixelData::Int16($body),
            $crate::image::DynPixelData::UInt32($arr) => $crate::image::DynPixelData::UInt32($body),
            $crate::image::DynPixelData::Int32($arr) => $crate::image::DynPixelData::Int32($body),
            $crate::image::DynPixelData::Float32($arr) => $crate::image::DynPixelData::Float32($body),
            $crate::image::DynPixelData::Float64($arr) => $crate::image::DynPixelData::Float64($body),
            $crate::image::DynPixelData::Rgba($arr) => $crate::image::DynPixelData::Rgba($body),
        }
    };
}
pub(crate) use map_pixel_data;

/// Helpers for the packed 8-bit ARGB sample layout used by [`DynPixelData::Rgba`]
pub mod rgba {
    /// Packs four 8-bit components into one `u32` sample
    pub fn pack(r: u8, g: u8, b: u8, a: u8) -> u32 {
        (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
    }
    pub fn red(sample: u32) -> u8 {
        (sample >> 16) as u8
    }
    pub fn green(sample: u32) -> u8 {
        (sample >> 8) as u8
    }
    pub fn blue(sample: u32) -> u8 {
        sample as u8
    }
    pub fn alpha(sample: u32) -> u8 {
        (sample >> 24) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rgba_packing_layout() {
        let sample = rgba::pack(0x12, 0x34, 0x56, 0x78);
        assert_eq!(sample, 0x7812_3456);
        assert_eq!(rgba::red(sample), 0x12);
        assert_eq!(rgba::green(sample), 0x34);
        assert_eq!(rgba::blue(sample), 0x56);
        assert_eq!(rgba::alpha(sample), 0x78);
    }

    #[test]
    fn downcast_checks_format() {
        let data = DynPixelData::UInt8(array![[1u8, 2], [3, 4]].into_dyn());
        let err: Result<ArrayD<f32>, _> = data.clone().try_into();
        assert_eq!(
            err.unwrap_err(),
            ConvertError::FormatMismatch {
                expected: SampleFormat::Float32,
                found: SampleFormat::UInt8,
            }
        );
        let ok: ArrayD<u8> = data.try_into().unwrap();
        assert_eq!(ok.shape(), &[2, 2]);
    }

    #[test]
    fn zeros_matches_requested_format_and_shape() {
        let data = DynPixelData::zeros(SampleFormat::Float64, &[3, 4, 2]);
        assert_eq!(data.sample_format(), SampleFormat::Float64);
        assert_eq!(data.shape(), &[3, 4, 2]);
        assert_eq!(data.len(), 24);
    }
}
