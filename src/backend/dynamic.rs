//! Priority-2 backend: the `image` crate's multi-format decoder
//!
//! The permissive catch-all of the chain. Decodes whatever the `image` crate can sniff from
//! the file contents (PNG, JPEG, BMP, single-page TIFF, and more) into 8-bit, 16-bit, or
//! float planes with an interleaved channel axis.

use error_stack::{report, Report, ResultExt};
use std::path::Path;

use super::{interleaved_to_array, Backend};
use crate::{
    error::BackendError,
    image::{AxisTag, DynPixelData, ImageStack},
};

const NAME: &str = "image";

pub(crate) struct DynamicImageBackend;

impl Backend for DynamicImageBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn try_open(&self, path: &Path) -> Result<ImageStack, Report<BackendError>> {
        let decoded = image::open(path).map_err(|e| report!(BackendError(NAME, e.to_string())))?;

        macro_rules! plane {
            ($buf:expr, $variant:ident, $channels:expr) => {{
                let (width, height) = $buf.dimensions();
                DynPixelData::$variant(interleaved_to_array(
                    NAME,
                    $buf.into_raw(),
                    width as usize,
                    height as usize,
                    $channels,
                )?)
            }};
        }

        use image::DynamicImage::*;
        let data = match decoded {
            ImageLuma8(buf) => plane!(buf, UInt8, 1),
            ImageLumaA8(buf) => plane!(buf, UInt8, 2),
            ImageRgb8(buf) => plane!(buf, UInt8, 3),
            ImageRgba8(buf) => plane!(buf, UInt8, 4),
            ImageLuma16(buf) => plane!(buf, UInt16, 1),
            ImageLumaA16(buf) => plane!(buf, UInt16, 2),
            ImageRgb16(buf) => plane!(buf, UInt16, 3),
            ImageRgba16(buf) => plane!(buf, UInt16, 4),
            ImageRgb32F(buf) => plane!(buf, Float32, 3),
            ImageRgba32F(buf) => plane!(buf, Float32, 4),
            other => {
                return Err(report!(BackendError(
                    NAME,
                    format!("unsupported pixel layout {:?}", other.color())
                )))
            }
        };

        let mut axes = vec![AxisTag::X, AxisTag::Y];
        if data.ndim() == 3 {
            axes.push(AxisTag::Channel);
        }
        ImageStack::new(data, axes)
            .change_context(BackendError(NAME, "decoded image has a degenerate geometry".to_string()))
    }
}
