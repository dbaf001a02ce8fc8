/*
    DreamPVR

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    dreampvr_headless::output.rs

    Writing frames pushed by the PVR to disk.
*/

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use dreampvr_core::machine::Frame;

/// Save a frame as `frame_NNNNN.png` in `dir`. Returns the path written.
pub fn save_frame(frame: &Frame, dir: &Path, index: u64) -> anyhow::Result<PathBuf> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let row_len = width * 3;

    // Packed 24-bit framebuffers can convert a few pixels more per line than the
    // nominal width. Every row carries the same surplus, so crop each one.
    if row_len == 0 || height == 0 {
        bail!("Frame is empty ({}x{})", frame.width, frame.height);
    }
    let stride = frame.pixels.len() / height;
    if stride < row_len {
        bail!(
            "Frame is {}x{} but only {} bytes of pixel data were pushed",
            frame.width,
            frame.height,
            frame.pixels.len()
        );
    }

    let mut rgb = Vec::with_capacity(row_len * height);
    for row in frame.pixels.chunks_exact(stride).take(height) {
        rgb.extend_from_slice(&row[..row_len]);
    }

    let path = dir.join(format!("frame_{:05}.png", index));
    image::save_buffer(
        &path,
        &rgb,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
    )
    .with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Saved frame: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips_through_png() {
        let dir = std::env::temp_dir().join(format!("dreampvr_output_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let frame = Frame {
            pixels: vec![0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF, 0x12, 0x34, 0x56, 0xAA],
            width: 2,
            height: 2,
            vblank: 0,
        };
        let path = save_frame(&frame, &dir, 7).unwrap();
        assert!(path.ends_with("frame_00007.png"));

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 1).0, [0x12, 0x34, 0x56]);

        _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wide_rows_are_cropped_to_width() {
        let dir = std::env::temp_dir().join(format!("dreampvr_crop_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        // Two rows of three pixels each for a 2x2 frame.
        let frame = Frame {
            pixels: vec![
                0x10, 0x10, 0x10, 0x20, 0x20, 0x20, 0xEE, 0xEE, 0xEE, //
                0x30, 0x30, 0x30, 0x40, 0x40, 0x40, 0xEE, 0xEE, 0xEE,
            ],
            width: 2,
            height: 2,
            vblank: 0,
        };
        let path = save_frame(&frame, &dir, 0).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(1, 0).0, [0x20, 0x20, 0x20]);
        assert_eq!(img.get_pixel(0, 1).0, [0x30, 0x30, 0x30]);
        assert_eq!(img.get_pixel(1, 1).0, [0x40, 0x40, 0x40]);

        _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn short_frame_is_an_error() {
        let frame = Frame {
            pixels: vec![0; 5],
            width: 2,
            height: 1,
            vblank: 0,
        };
        assert!(save_frame(&frame, &std::env::temp_dir(), 0).is_err());
    }
}
