use error_stack::{report, Report, ResultExt};
use strum::{Display, EnumString, EnumVariantNames};

use crate::error::{ConvertError, InvalidLayoutError};

mod axes;
pub use axes::{ensure_canonical_order, AxisTag, CANONICAL_AXES};

mod pixel_data;
pub(crate) use pixel_data::map_pixel_data;
pub use pixel_data::{rgba, DynPixelData};

/// The closed set of pixel sample formats a decoded image can carry
#[derive(Clone, Copy, Debug, Display, EnumString, EnumVariantNames, PartialEq, Eq)]
pub enum SampleFormat {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
    /// Packed 8-bit ARGB in a `u32`, see [`rgba`]
    Rgba,
}
impl SampleFormat {
    /// True for every scalar numeric format, false for [`Rgba`](Self::Rgba)
    pub fn is_real(&self) -> bool {
        !matches!(self, Self::Rgba)
    }
}

/// A dense multi-dimensional image: one typed sample buffer plus a label and a
/// calibration value for each dimension
///
/// This is the common currency every backend decodes into and every writer encodes from.
/// Dimension order is whatever the producer emitted; run the stack through
/// [`ensure_canonical_order`] to get the fixed (X, Y, Channel, Z, Time) order.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageStack {
    data: DynPixelData,
    axes: Vec<AxisTag>,
    calibration: Vec<f64>,
}
impl ImageStack {
    /// Wraps a pixel buffer with axis labels, one per dimension
    ///
    /// Fails when the buffer is 0-dimensional or has an empty extent, when the number of
    /// labels disagrees with the number of dimensions, or when a non-[`Unknown`](AxisTag::Unknown)
    /// label appears on more than one dimension.
    pub fn new(data: DynPixelData, axes: Vec<AxisTag>) -> Result<Self, Report<InvalidLayoutError>> {
        let shape = data.shape();
        if shape.is_empty() {
            return Err(report!(InvalidLayoutError))
                .attach_printable("An image must have at least one dimension");
        }
        if let Some(zero) = shape.iter().position(|&extent| extent == 0) {
            return Err(report!(InvalidLayoutError))
                .attach_printable(format!("Dimension {zero} has extent 0"));
        }
        if axes.len() != shape.len() {
            return Err(report!(InvalidLayoutError)).attach_printable(format!(
                "Found {} axis labels for a {}-dimensional buffer",
                axes.len(),
                shape.len()
            ));
        }
        for (i, tag) in axes.iter().enumerate() {
            if *tag != AxisTag::Unknown && axes[..i].contains(tag) {
                return Err(report!(InvalidLayoutError))
                    .attach_printable(format!("Axis {tag} appears more than once"));
            }
        }
        let calibration = vec![1.0; axes.len()];
        Ok(Self { data, axes, calibration })
    }

    /// Internal constructor for parts that are already known to be consistent
    pub(crate) fn from_parts(data: DynPixelData, axes: Vec<AxisTag>, calibration: Vec<f64>) -> Self {
        debug_assert_eq!(data.ndim(), axes.len());
        debug_assert_eq!(axes.len(), calibration.len());
        Self { data, axes, calibration }
    }

    pub fn data(&self) -> &DynPixelData {
        &self.data
    }
    pub fn data_mut(&mut self) -> &mut DynPixelData {
        &mut self.data
    }
    /// Consumes the stack, returning the bare pixel buffer
    pub fn into_data(self) -> DynPixelData {
        self.data
    }
    pub(crate) fn into_parts(self) -> (DynPixelData, Vec<AxisTag>, Vec<f64>) {
        (self.data, self.axes, self.calibration)
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.data.sample_format()
    }
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }
    /// One label per dimension, in buffer order
    pub fn axes(&self) -> &[AxisTag] {
        &self.axes
    }
    /// Physical size of one sample step per dimension, 1.0 when unknown
    pub fn calibration(&self) -> &[f64] {
        &self.calibration
    }
    pub fn set_calibration(&mut self, calibration: Vec<f64>) -> Result<(), Report<InvalidLayoutError>> {
        if calibration.len() != self.axes.len() {
            return Err(report!(InvalidLayoutError)).attach_printable(format!(
                "Found {} calibration values for a {}-dimensional image",
                calibration.len(),
                self.axes.len()
            ));
        }
        self.calibration = calibration;
        Ok(())
    }

    /// Extent of the first dimension carrying the given label, if any
    pub fn axis_len(&self, tag: AxisTag) -> Option<usize> {
        self.axes
            .iter()
            .position(|&t| t == tag)
            .map(|dim| self.shape()[dim])
    }

    /// Casts every sample to `f32`, keeping axes and calibration
    ///
    /// This is the loader-level coercion used before assembling mixed-format frames into one
    /// float stack. Fails for [`Rgba`](SampleFormat::Rgba) samples, which have no single
    /// scalar value to cast.
    pub fn into_float32(self) -> Result<Self, Report<ConvertError>> {
        let (data, axes, calibration) = self.into_parts();
        let data = match data {
            DynPixelData::UInt8(arr) => arr.mapv(|v| v as f32),
            DynPixelData::Int8(arr) => arr.mapv(|v| v as f32),
            DynPixelData::UInt16(arr) => arr.mapv(|v| v as f32),
            DynPixelData::Int16(arr) => arr.mapv(|v| v as f32),
            DynPixelData::UInt32(arr) => arr.mapv(|v| v as f32),
            DynPixelData::Int32(arr) => arr.mapv(|v| v as f32),
            DynPixelData::Float32(arr) => arr,
            DynPixelData::Float64(arr) => arr.mapv(|v| v as f32),
            DynPixelData::Rgba(_) => {
                return Err(report!(ConvertError::NotRealValued(SampleFormat::Rgba)))
            }
        };
        Ok(Self::from_parts(DynPixelData::Float32(data), axes, calibration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn constructor_validates_layout() {
        let arr = || ArrayD::<u8>::zeros(IxDyn(&[2, 3]));

        assert!(ImageStack::new(DynPixelData::UInt8(arr()), vec![AxisTag::X, AxisTag::Y]).is_ok());
        // label count must match rank
        assert!(ImageStack::new(DynPixelData::UInt8(arr()), vec![AxisTag::X]).is_err());
        // duplicate labels are rejected
        assert!(ImageStack::new(DynPixelData::UInt8(arr()), vec![AxisTag::X, AxisTag::X]).is_err());
        // empty extents are rejected
        let empty = ArrayD::<u8>::zeros(IxDyn(&[2, 0]));
        assert!(ImageStack::new(DynPixelData::UInt8(empty), vec![AxisTag::X, AxisTag::Y]).is_err());
    }

    #[test]
    fn into_float32_casts_every_real_format() {
        let arr = ArrayD::from_shape_fn(IxDyn(&[2, 2]), |ix| (ix[0] * 2 + ix[1]) as u16);
        let stack = ImageStack::new(DynPixelData::UInt16(arr), vec![AxisTag::X, AxisTag::Y])
            .unwrap()
            .into_float32()
            .unwrap();
        assert_eq!(stack.sample_format(), SampleFormat::Float32);
        let DynPixelData::Float32(out) = stack.data() else {
            panic!("expected f32 samples");
        };
        assert_eq!(out[[1, 1]], 3.0);
    }

    #[test]
    fn into_float32_rejects_packed_rgba() {
        let arr = ArrayD::<u32>::zeros(IxDyn(&[2, 2]));
        let stack = ImageStack::new(DynPixelData::Rgba(arr), vec![AxisTag::X, AxisTag::Y]).unwrap();
        assert!(stack.into_float32().is_err());
    }
}
