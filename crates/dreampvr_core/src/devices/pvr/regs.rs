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

    devices::pvr::regs.rs

    PVR register map, power-on defaults and bit-field views.

    Registers are stored as plain 32-bit words. Named fields are reached by
    unpacking a word into one of the bitfield structs below and packing it back;
    nothing ever aliases register storage.
*/

use modular_bitfield::{
    bitfield,
    prelude::{B10, B13, B16, B18, B2, B22, B3, B4, B6, B7, B8},
};

/// Size in bytes of the PVR register window.
pub const PVR_REG_WINDOW: u32 = 0x2000;
/// Number of 32-bit registers in the window.
pub const PVR_NUM_REGS: usize = (PVR_REG_WINDOW >> 2) as usize;

// Word offsets. Addresses in the Holly documentation are byte addresses
// relative to 0x005F8000; divide by four.
pub const ID: usize = 0x000 >> 2;
pub const REVISION: usize = 0x004 >> 2;
pub const SOFTRESET: usize = 0x008 >> 2;
pub const STARTRENDER: usize = 0x014 >> 2;
pub const TEST_SELECT: usize = 0x018 >> 2;
pub const PARAM_BASE: usize = 0x020 >> 2;
pub const REGION_BASE: usize = 0x02C >> 2;
pub const SPAN_SORT_CFG: usize = 0x030 >> 2;
pub const VO_BORDER_COL: usize = 0x040 >> 2;
pub const FB_R_CTRL: usize = 0x044 >> 2;
pub const FB_W_CTRL: usize = 0x048 >> 2;
pub const FB_W_LINESTRIDE: usize = 0x04C >> 2;
pub const FB_R_SOF1: usize = 0x050 >> 2;
pub const FB_R_SOF2: usize = 0x054 >> 2;
pub const FB_R_SIZE: usize = 0x05C >> 2;
pub const FB_W_SOF1: usize = 0x060 >> 2;
pub const FB_W_SOF2: usize = 0x064 >> 2;
pub const FB_X_CLIP: usize = 0x068 >> 2;
pub const FB_Y_CLIP: usize = 0x06C >> 2;
pub const FPU_SHAD_SCALE: usize = 0x074 >> 2;
pub const FPU_CULL_VAL: usize = 0x078 >> 2;
pub const FPU_PARAM_CFG: usize = 0x07C >> 2;
pub const HALF_OFFSET: usize = 0x080 >> 2;
pub const FPU_PERP_VAL: usize = 0x084 >> 2;
pub const ISP_BACKGND_D: usize = 0x088 >> 2;
pub const ISP_BACKGND_T: usize = 0x08C >> 2;
pub const ISP_FEED_CFG: usize = 0x098 >> 2;
pub const SDRAM_REFRESH: usize = 0x0A0 >> 2;
pub const SDRAM_ARB_CFG: usize = 0x0A4 >> 2;
pub const SDRAM_CFG: usize = 0x0A8 >> 2;
pub const FOG_COL_RAM: usize = 0x0B0 >> 2;
pub const FOG_COL_VERT: usize = 0x0B4 >> 2;
pub const FOG_DENSITY: usize = 0x0B8 >> 2;
pub const FOG_CLAMP_MAX: usize = 0x0BC >> 2;
pub const FOG_CLAMP_MIN: usize = 0x0C0 >> 2;
pub const SPG_TRIGGER_POS: usize = 0x0C4 >> 2;
pub const SPG_HBLANK_INT: usize = 0x0C8 >> 2;
pub const SPG_VBLANK_INT: usize = 0x0CC >> 2;
pub const SPG_CONTROL: usize = 0x0D0 >> 2;
pub const SPG_HBLANK: usize = 0x0D4 >> 2;
pub const SPG_LOAD: usize = 0x0D8 >> 2;
pub const SPG_VBLANK: usize = 0x0DC >> 2;
pub const SPG_WIDTH: usize = 0x0E0 >> 2;
pub const TEXT_CONTROL: usize = 0x0E4 >> 2;
pub const VO_CONTROL: usize = 0x0E8 >> 2;
pub const VO_STARTX: usize = 0x0EC >> 2;
pub const VO_STARTY: usize = 0x0F0 >> 2;
pub const SCALER_CTL: usize = 0x0F4 >> 2;
pub const PAL_RAM_CTRL: usize = 0x108 >> 2;
pub const SPG_STATUS: usize = 0x10C >> 2;
pub const FB_BURSTCTRL: usize = 0x110 >> 2;
pub const FB_C_SOF: usize = 0x114 >> 2;
pub const Y_COEFF: usize = 0x118 >> 2;
pub const PT_ALPHA_REF: usize = 0x11C >> 2;
pub const TA_OL_BASE: usize = 0x124 >> 2;
pub const TA_ISP_BASE: usize = 0x128 >> 2;
pub const TA_OL_LIMIT: usize = 0x12C >> 2;
pub const TA_ISP_LIMIT: usize = 0x130 >> 2;
pub const TA_NEXT_OPB: usize = 0x134 >> 2;
pub const TA_ITP_CURRENT: usize = 0x138 >> 2;
pub const TA_GLOB_TILE_CLIP: usize = 0x13C >> 2;
pub const TA_ALLOC_CTRL: usize = 0x140 >> 2;
pub const TA_LIST_INIT: usize = 0x144 >> 2;
pub const TA_YUV_TEX_BASE: usize = 0x148 >> 2;
pub const TA_YUV_TEX_CTRL: usize = 0x14C >> 2;
pub const TA_YUV_TEX_CNT: usize = 0x150 >> 2;
pub const TA_LIST_CONT: usize = 0x160 >> 2;
pub const TA_NEXT_OPB_INIT: usize = 0x164 >> 2;
pub const FOG_TABLE_START: usize = 0x200 >> 2;
pub const FOG_TABLE_END: usize = 0x3FC >> 2;
pub const TA_OL_POINTERS_START: usize = 0x600 >> 2;
pub const TA_OL_POINTERS_END: usize = 0xF5C >> 2;
pub const PALETTE_RAM_START: usize = 0x1000 >> 2;
pub const PALETTE_RAM_END: usize = 0x1FFC >> 2;

// Power-on values for registers that don't reset to zero.
const PVR_REG_DEFAULTS: [(usize, u32); 20] = [
    (ID, 0x17FD_11DB),
    (REVISION, 0x0000_0011),
    (SOFTRESET, 0x0000_0007),
    (FPU_PARAM_CFG, 0x0007_DF77),
    (HALF_OFFSET, 0x0000_0007),
    (ISP_FEED_CFG, 0x0040_2000),
    (SDRAM_REFRESH, 0x0000_0020),
    (SDRAM_ARB_CFG, 0x0000_001F),
    (SDRAM_CFG, 0x15F2_8997),
    (SPG_HBLANK_INT, 0x031D_0000),
    (SPG_VBLANK_INT, 0x0015_0104),
    (SPG_HBLANK, 0x007E_0345),
    (SPG_LOAD, 0x0106_0359),
    (SPG_VBLANK, 0x0150_0104),
    (SPG_WIDTH, 0x07F1_933F),
    (VO_CONTROL, 0x0000_0108),
    (VO_STARTX, 0x0000_009D),
    (SCALER_CTL, 0x0000_0400),
    (FB_BURSTCTRL, 0x0009_0639),
    (PT_ALPHA_REF, 0x0000_00FF),
];

/// Return a short name for a register offset, for logging.
pub fn reg_name(offset: usize) -> &'static str {
    match offset {
        ID => "ID",
        REVISION => "REVISION",
        SOFTRESET => "SOFTRESET",
        STARTRENDER => "STARTRENDER",
        FB_R_CTRL => "FB_R_CTRL",
        FB_W_CTRL => "FB_W_CTRL",
        FB_R_SOF1 => "FB_R_SOF1",
        FB_R_SOF2 => "FB_R_SOF2",
        FB_R_SIZE => "FB_R_SIZE",
        FB_W_SOF1 => "FB_W_SOF1",
        FB_W_SOF2 => "FB_W_SOF2",
        SPG_HBLANK_INT => "SPG_HBLANK_INT",
        SPG_VBLANK_INT => "SPG_VBLANK_INT",
        SPG_CONTROL => "SPG_CONTROL",
        SPG_HBLANK => "SPG_HBLANK",
        SPG_LOAD => "SPG_LOAD",
        SPG_VBLANK => "SPG_VBLANK",
        VO_CONTROL => "VO_CONTROL",
        SCALER_CTL => "SCALER_CTL",
        SPG_STATUS => "SPG_STATUS",
        TA_LIST_INIT => "TA_LIST_INIT",
        TA_YUV_TEX_BASE => "TA_YUV_TEX_BASE",
        TA_LIST_CONT => "TA_LIST_CONT",
        FOG_TABLE_START..=FOG_TABLE_END => "FOG_TABLE",
        TA_OL_POINTERS_START..=TA_OL_POINTERS_END => "TA_OL_POINTERS",
        PALETTE_RAM_START..=PALETTE_RAM_END => "PALETTE_RAM",
        _ => "?",
    }
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SpgLoad {
    pub hcount: B10,
    #[skip]
    unused0: B6,
    pub vcount: B10,
    #[skip]
    unused1: B6,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SpgHblank {
    pub hbstart: B10,
    #[skip]
    unused0: B6,
    pub hbend: B10,
    #[skip]
    unused1: B6,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SpgVblank {
    pub vbstart: B10,
    #[skip]
    unused0: B6,
    pub vbend: B10,
    #[skip]
    unused1: B6,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SpgHblankInt {
    pub line_comp_val: B10,
    #[skip]
    unused0: B2,
    pub hblank_int_mode: B2,
    #[skip]
    unused1: B2,
    pub hblank_in_interrupt: B10,
    #[skip]
    unused2: B6,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SpgVblankInt {
    pub vblank_in_line_number: B10,
    #[skip]
    unused0: B6,
    pub vblank_out_line_number: B10,
    #[skip]
    unused1: B6,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SpgControl {
    pub mhsync_pol: bool,
    pub mvsync_pol: bool,
    pub mcsync_pol: bool,
    pub spg_lock: bool,
    pub interlace: bool,
    pub force_field2: bool,
    pub ntsc: bool,
    pub pal: bool,
    pub sync_direction: bool,
    pub csync_on_h: bool,
    #[skip]
    unused: B22,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct SpgStatus {
    pub scanline: B10,
    pub fieldnum: bool,
    pub blank: bool,
    pub hsync: bool,
    pub vsync: bool,
    #[skip]
    unused: B18,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct FbRCtrl {
    pub fb_enable: bool,
    pub fb_line_double: bool,
    pub fb_depth: B2,
    pub fb_concat: B3,
    #[skip]
    unused0: bool,
    pub fb_chroma_threshold: B8,
    pub fb_stripsize: B6,
    pub fb_strip_buf_en: bool,
    pub vclk_div: bool,
    #[skip]
    unused1: B8,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct FbRSize {
    pub x: B10,
    pub y: B10,
    pub modulus: B10,
    #[skip]
    unused: B2,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct VoControl {
    pub hsync_pol: bool,
    pub vsync_pol: bool,
    pub blank_pol: bool,
    pub blank_video: bool,
    pub field_mode: B4,
    pub pixel_double: bool,
    #[skip]
    unused0: B7,
    pub pclk_delay: B6,
    #[skip]
    unused1: B10,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct ScalerCtl {
    pub scale_y: B16,
    pub scale_x: bool,
    pub interlace: bool,
    pub field_select: bool,
    #[skip]
    unused: B13,
}

macro_rules! reg_view {
    ($get:ident, $set:ident, $ty:ty, $offset:expr) => {
        #[inline]
        pub fn $get(&self) -> $ty {
            <$ty>::from_bytes(self.regs[$offset].to_le_bytes())
        }
        #[inline]
        pub fn $set(&mut self, val: $ty) {
            self.regs[$offset] = u32::from_le_bytes(val.into_bytes());
        }
    };
}

/// Backing storage for the PVR register window.
pub struct RegisterFile {
    regs: Box<[u32; PVR_NUM_REGS]>,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        let mut file = Self {
            regs: Box::new([0; PVR_NUM_REGS]),
        };
        file.load_defaults();
        file
    }

    /// Zero the register window and apply power-on values.
    pub fn load_defaults(&mut self) {
        self.regs.fill(0);
        for (offset, value) in PVR_REG_DEFAULTS {
            self.regs[offset] = value;
        }
    }

    #[inline]
    pub fn get(&self, offset: usize) -> u32 {
        self.regs[offset]
    }

    #[inline]
    pub fn set(&mut self, offset: usize, value: u32) {
        self.regs[offset] = value;
    }

    reg_view!(spg_load, set_spg_load, SpgLoad, SPG_LOAD);
    reg_view!(spg_hblank, set_spg_hblank, SpgHblank, SPG_HBLANK);
    reg_view!(spg_vblank, set_spg_vblank, SpgVblank, SPG_VBLANK);
    reg_view!(spg_hblank_int, set_spg_hblank_int, SpgHblankInt, SPG_HBLANK_INT);
    reg_view!(spg_vblank_int, set_spg_vblank_int, SpgVblankInt, SPG_VBLANK_INT);
    reg_view!(spg_control, set_spg_control, SpgControl, SPG_CONTROL);
    reg_view!(spg_status, set_spg_status, SpgStatus, SPG_STATUS);
    reg_view!(fb_r_ctrl, set_fb_r_ctrl, FbRCtrl, FB_R_CTRL);
    reg_view!(fb_r_size, set_fb_r_size, FbRSize, FB_R_SIZE);
    reg_view!(vo_control, set_vo_control, VoControl, VO_CONTROL);
    reg_view!(scaler_ctl, set_scaler_ctl, ScalerCtl, SCALER_CTL);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_unpack_to_expected_fields() {
        let regs = RegisterFile::new();

        let load = regs.spg_load();
        assert_eq!(load.hcount(), 0x359);
        assert_eq!(load.vcount(), 0x106);

        let vblank = regs.spg_vblank();
        assert_eq!(vblank.vbstart(), 0x104);
        assert_eq!(vblank.vbend(), 0x150);

        let hint = regs.spg_hblank_int();
        assert_eq!(hint.line_comp_val(), 0);
        assert_eq!(hint.hblank_int_mode(), 0);
        assert_eq!(hint.hblank_in_interrupt(), 0x31D);

        let vint = regs.spg_vblank_int();
        assert_eq!(vint.vblank_in_line_number(), 0x104);
        assert_eq!(vint.vblank_out_line_number(), 0x15);

        let vo = regs.vo_control();
        assert!(vo.blank_video());
        assert!(vo.pixel_double());

        assert_eq!(regs.scaler_ctl().scale_y(), 0x400);
        assert_eq!(regs.get(ID), 0x17FD_11DB);
    }

    #[test]
    fn field_views_pack_back_into_storage() {
        let mut regs = RegisterFile::new();

        regs.set_spg_status(regs.spg_status().with_scanline(0x3FF).with_vsync(true));
        assert_eq!(regs.get(SPG_STATUS), 0x2000 | 0x3FF);

        regs.set(FB_R_CTRL, 0x0080_000D);
        let ctrl = regs.fb_r_ctrl();
        assert!(ctrl.fb_enable());
        assert_eq!(ctrl.fb_depth(), 3);
        assert!(ctrl.vclk_div());

        // Views never spill into neighbouring registers.
        regs.set_fb_r_size(FbRSize::new().with_x(0x3FF).with_y(0x3FF).with_modulus(0x3FF));
        assert_eq!(regs.get(FB_R_SIZE), 0x3FFF_FFFF);
        assert_eq!(regs.get(FB_R_SIZE - 1), 0);
        assert_eq!(regs.get(FB_R_SIZE + 1), 0);
    }

    #[test]
    fn reg_names_cover_ranges() {
        assert_eq!(reg_name(SPG_LOAD), "SPG_LOAD");
        assert_eq!(reg_name(PALETTE_RAM_START + 3), "PALETTE_RAM");
        assert_eq!(reg_name(0x7E), "?");
    }
}
