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

    dreampvr_headless::pattern.rs

    Draws SMPTE-style colour bars directly into the framebuffer, the way boot
    code writes a splash screen without involving the TA.
*/

use dreampvr_config::FramebufferFormat;
use dreampvr_core::devices::pvr::{vram::vram64, Pvr, PvrError};

use crate::presets::FramebufferLayout;

pub const COLOR_BARS: [[u8; 3]; 8] = [
    [0xFF, 0xFF, 0xFF],
    [0xFF, 0xFF, 0x00],
    [0x00, 0xFF, 0xFF],
    [0x00, 0xFF, 0x00],
    [0xFF, 0x00, 0xFF],
    [0xFF, 0x00, 0x00],
    [0x00, 0x00, 0xFF],
    [0x00, 0x00, 0x00],
];

/// Colour of the bar covering column `x` of a frame `width` pixels wide.
pub fn bar_color(x: u32, width: u32) -> [u8; 3] {
    let bar = (x * COLOR_BARS.len() as u32 / width.max(1)) as usize;
    COLOR_BARS[bar.min(COLOR_BARS.len() - 1)]
}

pub fn draw_test_pattern(pvr: &mut Pvr, layout: &FramebufferLayout) -> Result<(), PvrError> {
    log::debug!(
        "Drawing {}x{} {} test pattern at {:08X}",
        layout.width,
        layout.height,
        layout.format,
        layout.base
    );

    let bpp = layout.format.bytes_per_pixel();
    for y in 0..layout.height {
        let line = layout.base + y * layout.stride();
        for x in 0..layout.width {
            let [r, g, b] = bar_color(x, layout.width);
            let addr = line + x * bpp;
            let (r, g, b) = (u32::from(r), u32::from(g), u32::from(b));

            match layout.format {
                FramebufferFormat::Rgb555 => {
                    let p = ((r >> 3) << 10) | ((g >> 3) << 5) | (b >> 3);
                    pvr.vram32_write(addr, p, 0xFFFF)?;
                }
                FramebufferFormat::Rgb565 => {
                    let p = ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3);
                    pvr.vram32_write(addr, p, 0xFFFF)?;
                }
                FramebufferFormat::Rgb888 => {
                    // Packed pixels are fetched as 3 contiguous bytes from the
                    // interleaved address of their first byte.
                    let base = vram64(addr);
                    for (i, c) in [b, g, r].into_iter().enumerate() {
                        pvr.vram64_write(base + i as u32, c, 0xFF)?;
                    }
                }
                FramebufferFormat::Krgb0888 => {
                    pvr.vram32_write(addr, (r << 16) | (g << 8) | b, 0xFFFF_FFFF)?;
                }
            }
        }
    }
    Ok(())
}
