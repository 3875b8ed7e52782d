//! Decoding backends and the acquisition chain
//!
//! Backends are stateless adapters behind a common [`Backend`] trait, registered once in a
//! fixed priority order. Opening an image walks the chain: the first backend that decodes the
//! file wins, and a backend failure moves on to the next one. Only when every backend has
//! refused does the chain fail, with each backend's complaint preserved in attempt order.

use error_stack::{report, Report, ResultExt};
use ndarray::{ArrayD, IxDyn};
use std::{path::Path, sync::OnceLock};

use crate::{
    error::{BackendError, OpenImageError},
    image::ImageStack,
};

mod dynamic;
mod native_tiff;
pub(crate) mod writer;

/// A single image-decoding backend
///
/// Implementations hold no state of their own; anything mutable lives on the stack of a
/// `try_open` call, so one backend instance can serve any number of threads at once.
pub trait Backend: Send + Sync {
    /// Short name used in logs and aggregate error messages
    fn name(&self) -> &'static str;
    /// Attempts to decode the file at `path` into an [`ImageStack`]
    fn try_open(&self, path: &Path) -> Result<ImageStack, Report<BackendError>>;
}

/// The chain, in strict priority order
fn backends() -> &'static [Box<dyn Backend>] {
    static REGISTRY: OnceLock<Vec<Box<dyn Backend>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        vec![
            Box::new(native_tiff::NativeTiff),
            Box::new(dynamic::DynamicImageBackend),
        ]
    })
}

pub(crate) fn open_with_chain(path: &Path) -> Result<ImageStack, Report<OpenImageError>> {
    let mut attempts = Vec::new();
    for backend in backends() {
        match backend.try_open(path) {
            Ok(image) => {
                tracing::debug!("Backend {} decoded {}", backend.name(), path.display());
                return Ok(image);
            }
            Err(failure) => {
                tracing::debug!("Backend {} passed on {}: {failure}", backend.name(), path.display());
                attempts.push(failure.to_string());
            }
        }
    }

    if !path.is_file() {
        return Err(report!(OpenImageError::NotFound))
            .attach_printable(format!("No readable file at {}", path.display()));
    }
    Err(report!(OpenImageError::UnsupportedFormat)).attach_printable(format!(
        "Every backend rejected {}:\n{}",
        path.display(),
        attempts.join("\n")
    ))
}

/// Reshapes a decoded row-major, channel-interleaved scanline buffer into the
/// (width, height[, channels]) dimension order used by [`ImageStack`]
///
/// Decoders hand out `height * width * channels` samples; the reorder is a stride
/// permutation, so no samples are copied.
fn interleaved_to_array<T>(
    backend: &'static str,
    samples: Vec<T>,
    width: usize,
    height: usize,
    channels: usize,
) -> Result<ArrayD<T>, Report<BackendError>> {
    let arr = if channels == 1 {
        ArrayD::from_shape_vec(IxDyn(&[height, width]), samples)
            .map(|arr| arr.permuted_axes(&[1, 0][..]))
    } else {
        ArrayD::from_shape_vec(IxDyn(&[height, width, channels]), samples)
            .map(|arr| arr.permuted_axes(&[1, 0, 2][..]))
    };
    arr.map_err(|e| {
        report!(BackendError(
            backend,
            format!("buffer does not match the advertised {width}x{height}x{channels} geometry: {e}")
        ))
    })
}
