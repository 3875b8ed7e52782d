//! Priority-1 backend: a native TIFF decoder
//!
//! Handles the grayscale, RGB, and RGBA TIFFs that dominate microscopy exports, including
//! multi-page files, at every scalar bit depth up to 64-bit floats. Pages of a multi-page
//! file become a trailing Z axis.

use error_stack::{report, Report, ResultExt};
use ndarray::Axis;
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};
use tiff::{
    decoder::{Decoder, DecodingResult},
    ColorType,
};

use super::{interleaved_to_array, Backend};
use crate::{
    error::BackendError,
    image::{AxisTag, DynPixelData, ImageStack},
};

const NAME: &str = "tiff";

fn fail(e: impl std::fmt::Display) -> Report<BackendError> {
    report!(BackendError(NAME, e.to_string()))
}

pub(crate) struct NativeTiff;

impl Backend for NativeTiff {
    fn name(&self) -> &'static str {
        NAME
    }

    fn try_open(&self, path: &Path) -> Result<ImageStack, Report<BackendError>> {
        let file = File::open(path).map_err(fail)?;
        let mut decoder = Decoder::new(BufReader::new(file)).map_err(fail)?;

        let mut pages = Vec::new();
        loop {
            pages.push(decode_page(&mut decoder)?);
            if !decoder.more_images() {
                break;
            }
            decoder.next_image().map_err(fail)?;
        }
        assemble(pages)
    }
}

fn decode_page<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<DynPixelData, Report<BackendError>> {
    let (width, height) = decoder.dimensions().map_err(fail)?;
    let (width, height) = (width as usize, height as usize);
    let channels = match decoder.colortype().map_err(fail)? {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) => 4,
        other => {
            return Err(report!(BackendError(
                NAME,
                format!("unsupported color type {other:?}")
            )))
        }
    };

    let data = match decoder.read_image().map_err(fail)? {
        DecodingResult::U8(buf) => {
            DynPixelData::UInt8(interleaved_to_array(NAME, buf, width, height, channels)?)
        }
        DecodingResult::I8(buf) => {
            DynPixelData::Int8(interleaved_to_array(NAME, buf, width, height, channels)?)
        }
        DecodingResult::U16(buf) => {
            DynPixelData::UInt16(interleaved_to_array(NAME, buf, width, height, channels)?)
        }
        DecodingResult::I16(buf) => {
            DynPixelData::Int16(interleaved_to_array(NAME, buf, width, height, channels)?)
        }
        DecodingResult::U32(buf) => {
            DynPixelData::UInt32(interleaved_to_array(NAME, buf, width, height, channels)?)
        }
        DecodingResult::I32(buf) => {
            DynPixelData::Int32(interleaved_to_array(NAME, buf, width, height, channels)?)
        }
        DecodingResult::F32(buf) => {
            DynPixelData::Float32(interleaved_to_array(NAME, buf, width, height, channels)?)
        }
        DecodingResult::F64(buf) => {
            DynPixelData::Float64(interleaved_to_array(NAME, buf, width, height, channels)?)
        }
        _ => {
            return Err(report!(BackendError(
                NAME,
                "unsupported sample bit depth".to_string()
            )))
        }
    };
    Ok(data)
}

fn assemble(mut pages: Vec<DynPixelData>) -> Result<ImageStack, Report<BackendError>> {
    let first = pages
        .first()
        .ok_or_else(|| report!(BackendError(NAME, "file contains no pages".to_string())))?;

    let mut axes = vec![AxisTag::X, AxisTag::Y];
    if first.ndim() == 3 {
        axes.push(AxisTag::Channel);
    }

    if pages.len() == 1 {
        let data = pages.remove(0);
        return ImageStack::new(data, axes)
            .change_context(BackendError(NAME, "decoded page has a degenerate geometry".to_string()));
    }

    let shape = first.shape().to_vec();
    for (i, page) in pages.iter().enumerate() {
        if page.shape() != shape {
            return Err(report!(BackendError(
                NAME,
                format!("page {i} geometry {:?} differs from page 0 geometry {shape:?}", page.shape())
            )));
        }
    }

    macro_rules! dispatch {
        ($($variant:ident),+) => {
            match &pages[0] {
                $(DynPixelData::$variant(_) => {
                    let mut views = Vec::with_capacity(pages.len());
                    for page in &pages {
                        match page {
                            DynPixelData::$variant(arr) => views.push(arr.view()),
                            other => {
                                return Err(report!(BackendError(
                                    NAME,
                                    format!(
                                        "pages mix {} and {} samples",
                                        pages[0].sample_format(),
                                        other.sample_format()
                                    )
                                )))
                            }
                        }
                    }
                    let stacked = ndarray::stack(Axis(views[0].ndim()), &views).map_err(fail)?;
                    DynPixelData::$variant(stacked)
                }),+
            }
        };
    }
    let data = dispatch!(UInt8, Int8, UInt16, Int16, UInt32, Int32, Float32, Float64, Rgba);

    axes.push(AxisTag::Z);
    ImageStack::new(data, axes)
        .change_context(BackendError(NAME, "decoded pages have a degenerate geometry".to_string()))
}
