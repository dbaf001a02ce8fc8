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

    dreampvr_headless::presets.rs

    Display presets. Each preset programs the SPG and framebuffer read
    registers through ordinary register writes, the way guest software would.
*/

use dreampvr_config::{DisplayPreset, FramebufferFormat};
use dreampvr_core::{
    devices::pvr::{
        regs::{self, FbRCtrl, FbRSize, SpgControl},
        PvrError,
    },
    machine::Machine,
};

/// Linear (32-bit path) address of the displayed framebuffer.
pub const FRAMEBUFFER_BASE: u32 = 0x0020_0000;

struct Timing {
    spg_load: u32,
    spg_hblank: u32,
    spg_vblank: u32,
    spg_hblank_int: u32,
    spg_vblank_int: u32,
    vo_control: u32,
    ntsc: bool,
    pal: bool,
    interlace: bool,
    vclk_div: bool,
    width: u32,
    height: u32,
}

const VGA: Timing = Timing {
    spg_load: 0x020C_0359,
    spg_hblank: 0x007E_0345,
    spg_vblank: 0x0028_0208,
    spg_hblank_int: 0x0345_0000,
    spg_vblank_int: 0x0015_0208,
    vo_control: 0x0016_0000,
    ntsc: false,
    pal: false,
    interlace: false,
    vclk_div: true,
    width: 640,
    height: 480,
};

const NTSC_I: Timing = Timing {
    spg_load: 0x020C_0359,
    spg_hblank: 0x007E_0345,
    spg_vblank: 0x0024_0204,
    spg_hblank_int: 0x0345_0000,
    spg_vblank_int: 0x0015_0104,
    vo_control: 0x0016_0000,
    ntsc: true,
    pal: false,
    interlace: true,
    vclk_div: false,
    width: 640,
    height: 480,
};

const PAL_I: Timing = Timing {
    spg_load: 0x0270_035F,
    spg_hblank: 0x008D_034B,
    spg_vblank: 0x002C_026C,
    spg_hblank_int: 0x0352_0000,
    spg_vblank_int: 0x0015_0136,
    vo_control: 0x0016_0000,
    ntsc: false,
    pal: true,
    interlace: true,
    vclk_div: false,
    width: 640,
    height: 480,
};

/// Where and how the displayed framebuffer lives in VRAM.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FramebufferLayout {
    pub base: u32,
    pub width: u32,
    pub height: u32,
    pub format: FramebufferFormat,
}

impl FramebufferLayout {
    /// Bytes per framebuffer line.
    pub fn stride(&self) -> u32 {
        self.width * self.format.bytes_per_pixel()
    }
}

fn timing(preset: DisplayPreset) -> &'static Timing {
    match preset {
        DisplayPreset::Vga => &VGA,
        DisplayPreset::NtscInterlaced => &NTSC_I,
        DisplayPreset::PalInterlaced => &PAL_I,
    }
}

/// Compute the register writes for a preset, in the order they should be made.
/// SPG_CONTROL goes before SPG_LOAD and FB_R_CTRL, since writing either of those
/// recalculates the line clock.
pub fn preset_registers(preset: DisplayPreset, format: FramebufferFormat) -> (Vec<(usize, u32)>, FramebufferLayout) {
    let t = timing(preset);
    let layout = FramebufferLayout {
        base: FRAMEBUFFER_BASE,
        width: t.width,
        height: t.height,
        format,
    };

    // FB_R_SIZE is in 32-bit units. Interlaced fields read every other line.
    let line_units = (layout.stride() / 4) as u16;
    let (y, modulus, sof2) = if t.interlace {
        ((t.height / 2 - 1) as u16, line_units + 1, layout.base + layout.stride())
    }
    else {
        ((t.height - 1) as u16, 1, layout.base)
    };
    let fb_r_size = FbRSize::new().with_x(line_units - 1).with_y(y).with_modulus(modulus);

    let spg_control = SpgControl::new()
        .with_interlace(t.interlace)
        .with_ntsc(t.ntsc)
        .with_pal(t.pal)
        .with_sync_direction(true);

    let fb_r_ctrl = FbRCtrl::new()
        .with_fb_enable(true)
        .with_fb_depth(format.fb_depth() as u8)
        .with_vclk_div(t.vclk_div);

    let writes = vec![
        (regs::FB_R_SIZE, u32::from_le_bytes(fb_r_size.into_bytes())),
        (regs::FB_R_SOF1, layout.base),
        (regs::FB_R_SOF2, sof2),
        (regs::SPG_CONTROL, u32::from_le_bytes(spg_control.into_bytes())),
        (regs::SPG_HBLANK, t.spg_hblank),
        (regs::SPG_VBLANK, t.spg_vblank),
        (regs::SPG_HBLANK_INT, t.spg_hblank_int),
        (regs::SPG_VBLANK_INT, t.spg_vblank_int),
        (regs::VO_CONTROL, t.vo_control),
        (regs::SCALER_CTL, 0x0000_0400),
        (regs::SPG_LOAD, t.spg_load),
        (regs::FB_R_CTRL, u32::from_le_bytes(fb_r_ctrl.into_bytes())),
    ];
    (writes, layout)
}

pub fn apply_preset(
    machine: &mut Machine,
    preset: DisplayPreset,
    format: FramebufferFormat,
) -> Result<FramebufferLayout, PvrError> {
    log::debug!("Applying display preset {} with {} framebuffer", preset, format);

    let (writes, layout) = preset_registers(preset, format);
    for (offset, value) in writes {
        machine.reg_write((offset as u32) << 2, value)?;
    }
    Ok(layout)
}
