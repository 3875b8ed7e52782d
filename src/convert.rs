//! Sample copy and conversion engine
//!
//! All operations iterate the *destination's* index space and read the source through a
//! caller-chosen boundary extension, so a destination larger than its source is filled with
//! the pad value rather than being an error. Conversions between formats go through a closed
//! rule table; asking for a pair with no rule fails with
//! [`ConvertError::UnsupportedConversion`] naming both formats.

use std::ops::AddAssign;

use error_stack::{report, Report, ResultExt};
use ndarray::{ArrayViewD, ArrayViewMutD, Dimension};
use num_traits::Zero;

use crate::{
    error::ConvertError,
    image::{rgba, DynPixelData, SampleFormat},
};

/// A read-only view extended past its bounds with a constant pad value
///
/// Reads at coordinates outside the view (in any dimension, including trailing dimensions the
/// view does not have) return the pad value instead of failing.
pub struct Extended<'a, T> {
    view: ArrayViewD<'a, T>,
    pad: T,
}
impl<'a, T: Clone> Extended<'a, T> {
    pub fn with_pad(view: ArrayViewD<'a, T>, pad: T) -> Self {
        Self { view, pad }
    }
    /// Extends the view with zeros
    pub fn zero(view: ArrayViewD<'a, T>) -> Self
    where
        T: Zero,
    {
        Self::with_pad(view, T::zero())
    }
    /// The sample at `index`, or the pad value when `index` lies outside the view
    /// or has the wrong number of coordinates
    pub fn at(&self, index: &[usize]) -> T {
        self.view
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.pad.clone())
    }
}

/// Copies every sample of `source` into `dest`, iterating the destination's index space
pub fn copy<T: Clone>(source: &Extended<'_, T>, dest: &mut ArrayViewMutD<'_, T>) {
    for (index, out) in dest.indexed_iter_mut() {
        *out = source.at(index.slice());
    }
}

/// Adds every sample of `source` onto `dest`, iterating the destination's index space
pub fn add<T: Clone + AddAssign>(source: &Extended<'_, T>, dest: &mut ArrayViewMutD<'_, T>) {
    for (index, out) in dest.indexed_iter_mut() {
        *out += source.at(index.slice());
    }
}

/// Minimum and maximum over anything iterable, or `None` when there is nothing to compare
///
/// Uses ordered comparison seeded from the first element, so NaNs after the first
/// element never win.
pub fn compute_min_max<'a, T, I>(samples: I) -> Option<(T, T)>
where
    I: IntoIterator<Item = &'a T>,
    T: PartialOrd + Clone + 'a,
{
    let mut iter = samples.into_iter();
    let first = iter.next()?;
    let (mut min, mut max) = (first.clone(), first.clone());
    for sample in iter {
        if *sample < min {
            min = sample.clone();
        }
        if *sample > max {
            max = sample.clone();
        }
    }
    Some((min, max))
}

fn copy_into<T: Clone + Zero>(source: &ndarray::ArrayD<T>, dest: &mut ndarray::ArrayD<T>) {
    copy(&Extended::zero(source.view()), &mut dest.view_mut());
}

fn add_into<T: Clone + Zero + AddAssign>(source: &ndarray::ArrayD<T>, dest: &mut ndarray::ArrayD<T>) {
    add(&Extended::zero(source.view()), &mut dest.view_mut());
}

/// Copies between two buffers of the same sample format, zero-extending the source
///
/// Fails with [`ConvertError::FormatMismatch`] when the formats differ; use
/// [`convert_and_copy`] for cross-format copies.
pub fn copy_samples(source: &DynPixelData, dest: &mut DynPixelData) -> Result<(), Report<ConvertError>> {
    use DynPixelData::*;
    match (source, dest) {
        (UInt8(s), UInt8(d)) => Ok(copy_into(s, d)),
        (Int8(s), Int8(d)) => Ok(copy_into(s, d)),
        (UInt16(s), UInt16(d)) => Ok(copy_into(s, d)),
        (Int16(s), Int16(d)) => Ok(copy_into(s, d)),
        (UInt32(s), UInt32(d)) => Ok(copy_into(s, d)),
        (Int32(s), Int32(d)) => Ok(copy_into(s, d)),
        (Float32(s), Float32(d)) => Ok(copy_into(s, d)),
        (Float64(s), Float64(d)) => Ok(copy_into(s, d)),
        (Rgba(s), Rgba(d)) => Ok(copy_into(s, d)),
        (source, dest) => Err(report!(ConvertError::FormatMismatch {
            expected: dest.sample_format(),
            found: source.sample_format(),
        })),
    }
}

/// Accumulates `source` onto `dest`, both of the same real-valued sample format
pub fn add_samples(source: &DynPixelData, dest: &mut DynPixelData) -> Result<(), Report<ConvertError>> {
    use DynPixelData::*;
    match (source, dest) {
        (UInt8(s), UInt8(d)) => Ok(add_into(s, d)),
        (Int8(s), Int8(d)) => Ok(add_into(s, d)),
        (UInt16(s), UInt16(d)) => Ok(add_into(s, d)),
        (Int16(s), Int16(d)) => Ok(add_into(s, d)),
        (UInt32(s), UInt32(d)) => Ok(add_into(s, d)),
        (Int32(s), Int32(d)) => Ok(add_into(s, d)),
        (Float32(s), Float32(d)) => Ok(add_into(s, d)),
        (Float64(s), Float64(d)) => Ok(add_into(s, d)),
        (Rgba(_), Rgba(_)) => Err(report!(ConvertError::NotRealValued(SampleFormat::Rgba))),
        (source, dest) => Err(report!(ConvertError::FormatMismatch {
            expected: dest.sample_format(),
            found: source.sample_format(),
        })),
    }
}

/// Copies `source` into `dest`, converting samples when the formats differ
///
/// Same-format pairs behave exactly like [`copy_samples`]. Cross-format pairs go through the
/// rule table; the supported conversions are f32 to f64, i32, or packed RGBA, and u16 to f32,
/// f64, or i32. Every other pair fails with
/// [`ConvertError::UnsupportedConversion`].
pub fn convert_and_copy(source: &DynPixelData, dest: &mut DynPixelData) -> Result<(), Report<ConvertError>> {
    let (from, to) = (source.sample_format(), dest.sample_format());
    if from == to {
        return copy_samples(source, dest);
    }
    match rule_for(from, to) {
        Some(rule) => rule(source, dest)
            .attach_printable_lazy(|| format!("While converting {from} samples to {to}")),
        None => Err(report!(ConvertError::UnsupportedConversion { from, to })),
    }
}

type RuleFn = fn(&DynPixelData, &mut DynPixelData) -> Result<(), Report<ConvertError>>;

/// The closed table of cross-format conversion rules
fn rule_for(from: SampleFormat, to: SampleFormat) -> Option<RuleFn> {
    use SampleFormat::*;
    match (from, to) {
        (Float32, Float64) => Some(widen_f32_to_f64),
        (Float32, Int32) => Some(round_f32_to_i32),
        (Float32, Rgba) => Some(gray_f32_to_rgba),
        (UInt16, Float32) => Some(widen_u16_to_f32),
        (UInt16, Float64) => Some(widen_u16_to_f64),
        (UInt16, Int32) => Some(widen_u16_to_i32),
        _ => None,
    }
}

macro_rules! conversion_rule {
    ($name:ident, $from:ident => $to:ident, |$v:ident| $map:expr) => {
        fn $name(source: &DynPixelData, dest: &mut DynPixelData) -> Result<(), Report<ConvertError>> {
            match (source, dest) {
                (DynPixelData::$from(source), DynPixelData::$to(dest)) => {
                    for (index, out) in dest.indexed_iter_mut() {
                        let $v = source.get(index.slice()).copied().unwrap_or_default();
                        *out = $map;
                    }
                    Ok(())
                }
                (source, dest) => Err(report!(ConvertError::FormatMismatch {
                    expected: dest.sample_format(),
                    found: source.sample_format(),
                })),
            }
        }
    };
}

conversion_rule!(widen_f32_to_f64, Float32 => Float64, |v| v as f64);
// ties round away from zero
conversion_rule!(round_f32_to_i32, Float32 => Int32, |v| v.round() as i32);
conversion_rule!(widen_u16_to_f32, UInt16 => Float32, |v| v as f32);
conversion_rule!(widen_u16_to_f64, UInt16 => Float64, |v| v as f64);
conversion_rule!(widen_u16_to_i32, UInt16 => Int32, |v| v as i32);

/// Scales [0, 1] gray samples to 8-bit and replicates them into R, G, and B with full alpha
///
/// Destination samples outside the source bounds are padded white. Sources are expected to be
/// normalized; a sample above 1.0 fails rather than wrapping, and negative samples clamp to 0.
fn gray_f32_to_rgba(source: &DynPixelData, dest: &mut DynPixelData) -> Result<(), Report<ConvertError>> {
    match (source, dest) {
        (DynPixelData::Float32(source), DynPixelData::Rgba(dest)) => {
            for (index, out) in dest.indexed_iter_mut() {
                let gray = match source.get(index.slice()) {
                    Some(&sample) => {
                        let scaled = (sample * 255.0).round();
                        if scaled > 255.0 {
                            return Err(report!(ConvertError::UnsupportedConversion {
                                from: SampleFormat::Float32,
                                to: SampleFormat::Rgba,
                            }))
                            .attach_printable(format!(
                                "Sample {sample} lies outside [0, 1]; rescale the source first"
                            ));
                        }
                        scaled as u8
                    }
                    None => 255,
                };
                *out = rgba::pack(gray, gray, gray, 255);
            }
            Ok(())
        }
        (source, dest) => Err(report!(ConvertError::FormatMismatch {
            expected: dest.sample_format(),
            found: source.sample_format(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ArrayD, IxDyn};

    #[test]
    fn copy_pads_past_the_source_bounds() {
        let source = array![[1u8, 2], [3, 4]].into_dyn();
        let mut dest = ArrayD::zeros(IxDyn(&[3, 3]));
        copy(&Extended::with_pad(source.view(), 9), &mut dest.view_mut());
        assert_eq!(dest, array![[1, 2, 9], [3, 4, 9], [9, 9, 9]].into_dyn());
    }

    #[test]
    fn copy_reads_lower_dimensional_sources_as_pad() {
        let source = ArrayD::from_shape_vec(IxDyn(&[2]), vec![7u8, 8]).unwrap();
        let mut dest = ArrayD::zeros(IxDyn(&[2, 2]));
        copy(&Extended::zero(source.view()), &mut dest.view_mut());
        assert_eq!(dest, array![[0, 0], [0, 0]].into_dyn());
    }

    #[test]
    fn add_accumulates() {
        let source = array![[1.0f32, 2.0], [3.0, 4.0]].into_dyn();
        let mut dest = array![[10.0f32, 10.0], [10.0, 10.0]].into_dyn();
        add(&Extended::zero(source.view()), &mut dest.view_mut());
        assert_eq!(dest, array![[11.0, 12.0], [13.0, 14.0]].into_dyn());
    }

    #[test]
    fn round_trip_copy_is_bit_exact() {
        let a = array![[0.25f32, -1.5], [f32::MIN_POSITIVE, 1e30]].into_dyn();
        let mut b = DynPixelData::zeros(SampleFormat::Float32, &[2, 2]);
        let mut c = DynPixelData::zeros(SampleFormat::Float32, &[2, 2]);
        copy_samples(&DynPixelData::Float32(a.clone()), &mut b).unwrap();
        copy_samples(&b, &mut c).unwrap();
        assert_eq!(c, DynPixelData::Float32(a));
    }

    #[test]
    fn copy_rejects_mismatched_formats() {
        let source = DynPixelData::zeros(SampleFormat::UInt8, &[2, 2]);
        let mut dest = DynPixelData::zeros(SampleFormat::UInt16, &[2, 2]);
        let err = copy_samples(&source, &mut dest).unwrap_err();
        assert_eq!(
            err.current_context(),
            &ConvertError::FormatMismatch {
                expected: SampleFormat::UInt16,
                found: SampleFormat::UInt8,
            }
        );
    }

    #[test]
    fn f32_widens_to_f64() {
        let source = DynPixelData::Float32(array![[0.5f32, -2.25]].into_dyn());
        let mut dest = DynPixelData::zeros(SampleFormat::Float64, &[1, 2]);
        convert_and_copy(&source, &mut dest).unwrap();
        assert_eq!(dest, DynPixelData::Float64(array![[0.5f64, -2.25]].into_dyn()));
    }

    #[test]
    fn f32_rounds_to_i32_half_away_from_zero() {
        let source = DynPixelData::Float32(array![[0.5f32, 1.5, -0.5, -1.5, 2.4]].into_dyn());
        let mut dest = DynPixelData::zeros(SampleFormat::Int32, &[1, 5]);
        convert_and_copy(&source, &mut dest).unwrap();
        assert_eq!(dest, DynPixelData::Int32(array![[1, 2, -1, -2, 2]].into_dyn()));
    }

    #[test]
    fn u16_widens_exactly() {
        let source = array![[0u16, 1, 65535]].into_dyn();
        let mut as_f32 = DynPixelData::zeros(SampleFormat::Float32, &[1, 3]);
        let mut as_f64 = DynPixelData::zeros(SampleFormat::Float64, &[1, 3]);
        let mut as_i32 = DynPixelData::zeros(SampleFormat::Int32, &[1, 3]);
        convert_and_copy(&DynPixelData::UInt16(source.clone()), &mut as_f32).unwrap();
        convert_and_copy(&DynPixelData::UInt16(source.clone()), &mut as_f64).unwrap();
        convert_and_copy(&DynPixelData::UInt16(source), &mut as_i32).unwrap();
        assert_eq!(as_f32, DynPixelData::Float32(array![[0.0f32, 1.0, 65535.0]].into_dyn()));
        assert_eq!(as_f64, DynPixelData::Float64(array![[0.0f64, 1.0, 65535.0]].into_dyn()));
        assert_eq!(as_i32, DynPixelData::Int32(array![[0, 1, 65535]].into_dyn()));
    }

    #[test]
    fn normalized_f32_becomes_gray_rgba() {
        let source = DynPixelData::Float32(array![[0.0f32, 1.0]].into_dyn());
        let mut dest = DynPixelData::zeros(SampleFormat::Rgba, &[1, 2]);
        convert_and_copy(&source, &mut dest).unwrap();
        let expected = array![[rgba::pack(0, 0, 0, 255), rgba::pack(255, 255, 255, 255)]].into_dyn();
        assert_eq!(dest, DynPixelData::Rgba(expected));
    }

    #[test]
    fn f32_to_rgba_pads_white_past_the_source() {
        let source = DynPixelData::Float32(array![[0.0f32]].into_dyn());
        let mut dest = DynPixelData::zeros(SampleFormat::Rgba, &[1, 2]);
        convert_and_copy(&source, &mut dest).unwrap();
        let expected = array![[rgba::pack(0, 0, 0, 255), rgba::pack(255, 255, 255, 255)]].into_dyn();
        assert_eq!(dest, DynPixelData::Rgba(expected));
    }

    #[test]
    fn f32_to_rgba_rejects_samples_above_one() {
        let source = DynPixelData::Float32(array![[1.5f32]].into_dyn());
        let mut dest = DynPixelData::zeros(SampleFormat::Rgba, &[1, 1]);
        assert!(convert_and_copy(&source, &mut dest).is_err());
    }

    #[test]
    fn unlisted_pairs_are_unsupported() {
        let source = DynPixelData::zeros(SampleFormat::UInt8, &[2, 2]);
        let mut dest = DynPixelData::zeros(SampleFormat::Float64, &[2, 2]);
        let err = convert_and_copy(&source, &mut dest).unwrap_err();
        assert_eq!(
            err.current_context(),
            &ConvertError::UnsupportedConversion {
                from: SampleFormat::UInt8,
                to: SampleFormat::Float64,
            }
        );
    }

    #[test]
    fn min_max_single_ordered_pass() {
        let samples = [3u16, 1, 4, 1, 5, 9, 2, 6];
        assert_eq!(compute_min_max(samples.iter()), Some((1, 9)));
        assert_eq!(compute_min_max(std::iter::empty::<&u16>()), None);
    }
}
