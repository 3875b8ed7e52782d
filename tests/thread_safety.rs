//! The whole read path must be shareable across threads: backends hold no per-call state,
//! so concurrent opens of different files must never cross wires. Writes first, all
//! concurrent, then concurrent reads verifying every file holds exactly its own samples.

use ndarray::{ArrayD, IxDyn};
use std::{path::Path, thread};
use stackio::{open_image, save_image, AxisTag, DynPixelData, ImageStack};

const THREADS: usize = 5;
const IMAGES_PER_THREAD: usize = 200;
const WIDTH: usize = 64;
const HEIGHT: usize = 48;

/// Deterministic, distinct content per image index
fn sample(index: usize, x: usize, y: usize) -> u8 {
    (index.wrapping_mul(31) ^ x.wrapping_mul(7) ^ y.wrapping_mul(13)) as u8
}

fn make_image(index: usize) -> ImageStack {
    let arr = ArrayD::from_shape_fn(IxDyn(&[WIDTH, HEIGHT]), |ix| sample(index, ix[0], ix[1]));
    ImageStack::new(DynPixelData::UInt8(arr), vec![AxisTag::X, AxisTag::Y]).unwrap()
}

fn image_path(dir: &Path, index: usize) -> std::path::PathBuf {
    dir.join(format!("img_{index:04}.tif"))
}

#[test]
fn concurrent_saves_and_loads_never_cross_wires() {
    let dir = tempfile::tempdir().unwrap();
    let dir = dir.path();

    thread::scope(|scope| {
        for t in 0..THREADS {
            scope.spawn(move || {
                for i in (t * IMAGES_PER_THREAD)..((t + 1) * IMAGES_PER_THREAD) {
                    save_image(&make_image(i), image_path(dir, i)).unwrap();
                }
            });
        }
    });

    thread::scope(|scope| {
        for t in 0..THREADS {
            scope.spawn(move || {
                for i in (t * IMAGES_PER_THREAD)..((t + 1) * IMAGES_PER_THREAD) {
                    let reloaded = open_image(image_path(dir, i)).unwrap();
                    assert_eq!(reloaded.shape(), &[WIDTH, HEIGHT]);
                    let DynPixelData::UInt8(arr) = reloaded.data() else {
                        panic!("image {i} came back with the wrong sample format");
                    };
                    for ((x, y), &value) in
                        arr.indexed_iter().map(|(ix, v)| ((ix[0], ix[1]), v))
                    {
                        assert_eq!(
                            value,
                            sample(i, x, y),
                            "image {i} holds foreign samples at ({x}, {y})"
                        );
                    }
                }
            });
        }
    });
}
