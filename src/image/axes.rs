use error_stack::{report, Report, ResultExt};
use ndarray::Axis;
use strum::{Display, EnumString, EnumVariantNames};

use super::{pixel_data::map_pixel_data, ImageStack};
use crate::error::UnsupportedAxisError;

/// Label for one dimension of an [`ImageStack`]
///
/// Backends attach whichever labels the decoded file implies; consumers that need a fixed
/// dimension order run the stack through [`ensure_canonical_order`] first.
#[derive(Clone, Copy, Debug, Display, EnumString, EnumVariantNames, PartialEq, Eq)]
pub enum AxisTag {
    X,
    Y,
    Channel,
    Z,
    Time,
    /// A dimension whose meaning the producing backend could not determine.
    /// Cannot be canonicalized.
    Unknown,
}

/// The canonical dimension order: X, Y, Channel, Z, Time
pub const CANONICAL_AXES: [AxisTag; 5] = [
    AxisTag::X,
    AxisTag::Y,
    AxisTag::Channel,
    AxisTag::Z,
    AxisTag::Time,
];

impl AxisTag {
    /// Position of this axis in the canonical order, or `None` for [`Unknown`](Self::Unknown)
    pub fn canonical_slot(&self) -> Option<usize> {
        match self {
            AxisTag::X => Some(0),
            AxisTag::Y => Some(1),
            AxisTag::Channel => Some(2),
            AxisTag::Z => Some(3),
            AxisTag::Time => Some(4),
            AxisTag::Unknown => None,
        }
    }
}

/// Rewrites a stack into canonical (X, Y, Channel, Z, Time) dimension order
///
/// Missing axes are inserted as singleton dimensions, so the result is always 5-D.
/// The reorder is a stride permutation over the existing buffer; no samples are copied.
/// A stack that is already canonical 5-D is returned unchanged.
///
/// Fails if any axis is labeled [`Unknown`](AxisTag::Unknown) or if two axes
/// carry the same label.
pub fn ensure_canonical_order(stack: ImageStack) -> Result<ImageStack, Report<UnsupportedAxisError>> {
    let mut slot_of_dim = Vec::with_capacity(5);
    let mut seen = [false; 5];
    for &tag in stack.axes() {
        let slot = tag
            .canonical_slot()
            .ok_or_else(|| report!(UnsupportedAxisError(tag)))?;
        if seen[slot] {
            return Err(report!(UnsupportedAxisError(tag)))
                .attach_printable(format!("Axis {tag} appears more than once"));
        }
        seen[slot] = true;
        slot_of_dim.push(slot);
    }

    if slot_of_dim == [0, 1, 2, 3, 4] {
        return Ok(stack);
    }

    let (data, _, calibration) = stack.into_parts();

    // singleton dimensions for the missing slots go at the end, before the permutation
    let mut padded_calibration = calibration;
    for slot in 0..5 {
        if !seen[slot] {
            slot_of_dim.push(slot);
            padded_calibration.push(1.0);
        }
    }

    // inverse permutation: canonical slot s is taken from current dimension perm[s]
    let mut perm = [0usize; 5];
    for (dim, &slot) in slot_of_dim.iter().enumerate() {
        perm[slot] = dim;
    }

    let data = map_pixel_data!(data, |arr| {
        let mut arr = arr;
        while arr.ndim() < 5 {
            let ndim = arr.ndim();
            arr = arr.insert_axis(Axis(ndim));
        }
        arr.permuted_axes(&perm[..])
    });
    let calibration = perm.iter().map(|&dim| padded_calibration[dim]).collect();

    Ok(ImageStack::from_parts(data, CANONICAL_AXES.to_vec(), calibration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DynPixelData;
    use ndarray::{ArrayD, IxDyn};

    fn gray_2d() -> ImageStack {
        let arr = ArrayD::from_shape_fn(IxDyn(&[4, 3]), |ix| (ix[0] * 10 + ix[1]) as u8);
        ImageStack::new(DynPixelData::UInt8(arr), vec![AxisTag::X, AxisTag::Y]).unwrap()
    }

    #[test]
    fn pads_2d_to_canonical_5d() {
        let canonical = ensure_canonical_order(gray_2d()).unwrap();
        assert_eq!(canonical.shape(), &[4, 3, 1, 1, 1]);
        assert_eq!(canonical.axes(), CANONICAL_AXES);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = ensure_canonical_order(gray_2d()).unwrap();
        let twice = ensure_canonical_order(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn permutes_out_of_order_axes_without_losing_samples() {
        // (Time, Y, X) input: value encodes its own coordinates
        let arr = ArrayD::from_shape_fn(IxDyn(&[2, 3, 4]), |ix| {
            (ix[0] * 100 + ix[1] * 10 + ix[2]) as u16
        });
        let stack = ImageStack::new(
            DynPixelData::UInt16(arr.clone()),
            vec![AxisTag::Time, AxisTag::Y, AxisTag::X],
        )
        .unwrap();

        let canonical = ensure_canonical_order(stack).unwrap();
        assert_eq!(canonical.shape(), &[4, 3, 1, 1, 2]);
        let DynPixelData::UInt16(out) = canonical.data() else {
            panic!("sample format changed during canonicalization");
        };
        for t in 0..2 {
            for y in 0..3 {
                for x in 0..4 {
                    assert_eq!(out[[x, y, 0, 0, t]], arr[[t, y, x]]);
                }
            }
        }
    }

    #[test]
    fn unknown_axis_is_rejected() {
        let arr = ArrayD::<u8>::zeros(IxDyn(&[2, 2]));
        let stack =
            ImageStack::new(DynPixelData::UInt8(arr), vec![AxisTag::X, AxisTag::Unknown]).unwrap();
        assert!(ensure_canonical_order(stack).is_err());
    }

    #[test]
    fn calibration_follows_its_axis() {
        let arr = ArrayD::<u8>::zeros(IxDyn(&[2, 3]));
        let mut stack =
            ImageStack::new(DynPixelData::UInt8(arr), vec![AxisTag::Y, AxisTag::X]).unwrap();
        stack.set_calibration(vec![0.5, 2.0]).unwrap();

        let canonical = ensure_canonical_order(stack).unwrap();
        assert_eq!(canonical.calibration(), &[2.0, 0.5, 1.0, 1.0, 1.0]);
    }
}
