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

    devices::pvr::pvr_error.rs

    Error type for the PVR device.
*/

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PvrError {
    #[error("Unsupported SPG_HBLANK_INT.hblank_int_mode: {0}")]
    UnsupportedHblankIntMode(u8),
    #[error("Unsupported FB_R_CTRL.fb_depth: {0}")]
    UnsupportedFramebufferDepth(u8),
    #[error("VRAM access out of bounds: {len} byte(s) at {addr:08X}")]
    VramOutOfBounds { addr: u32, len: usize },
}

impl PvrError {
    /// Fatal errors halt emulation. The device is left in a state where continuing
    /// would produce garbage.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PvrError::UnsupportedHblankIntMode(_) | PvrError::UnsupportedFramebufferDepth(_)
        )
    }
}
