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

    devices::pvr::draw.rs

    Framebuffer extraction for directly written frames.

    Normally the TA renders a frame and the host presents it without the
    framebuffer in VRAM ever being read back. Some software (the IP.BIN license
    screen, for one) writes pixels straight into VRAM instead. To catch this,
    each framebuffer named by FB_W_SOF1/2 is stamped with a cookie when
    STARTRENDER is written. At vblank, if no render was started this frame and
    the cookie at the displayed field is gone, the framebuffer is converted to
    RGB888 and pushed to the host.
*/

use super::{regs::*, vram::vram64, Pvr, PvrError};
use crate::device_traits::pvrhost::PvrHost;

pub const FRAMEBUFFER_COOKIE: u32 = 0xDEAD_BEEF;

// Framebuffers at or above this address are render-to-texture targets.
const TEXTURE_TARGET_BIT: u32 = 0x0100_0000;

// A framebuffer marked this frame may be displayed as field 2 of the next, at
// addr + line_size + line_mod. Stamp the likely candidates.
const MARK_LINE_WIDTHS: [u32; 2] = [320, 640];
const MARK_LINE_BPP: [u32; 3] = [2, 3, 4];
const MARK_LINE_SCALES: [u32; 2] = [1, 2];

impl Pvr {
    pub fn mark_framebuffer(&mut self, addr: u32) {
        if addr & TEXTURE_TARGET_BIT != 0 {
            log::trace!("mark_framebuffer(): skipping texture target {:08X}", addr);
            return;
        }

        self.vram.write_u32_wrapping(vram64(addr), FRAMEBUFFER_COOKIE);

        for width in MARK_LINE_WIDTHS {
            for bpp in MARK_LINE_BPP {
                for scale in MARK_LINE_SCALES {
                    let next_line = addr.wrapping_add(width * bpp * scale);
                    self.vram.write_u32_wrapping(vram64(next_line), FRAMEBUFFER_COOKIE);
                }
            }
        }
    }

    /// Returns true if the framebuffer at `addr` has been written since it was
    /// last marked.
    pub fn test_framebuffer(&self, addr: u32) -> bool {
        u32::from_le_bytes(self.vram.read_wrapping(vram64(addr))) != FRAMEBUFFER_COOKIE
    }

    /// Dimensions in pixels of the displayed framebuffer.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.regs.fb_r_size();
        let mut width = u32::from(size.x()) + 1;
        let mut height = u32::from(size.y()) + 1;

        // FB_R_SIZE.x is in 32-bit units
        match self.regs.fb_r_ctrl().fb_depth() {
            0 | 1 => width *= 2,
            2 => width = width * 4 / 3,
            _ => {}
        }

        if self.regs.spg_control().interlace() {
            height *= 2;
        }
        (width, height)
    }

    /// Dimensions of the image the software originally rendered, before the
    /// CORE scaled it into the framebuffer.
    pub fn video_size(&self) -> (u32, u32) {
        let (mut width, mut height) = self.framebuffer_size();
        let scaler = self.regs.scaler_ctl();

        // horizontal supersampling renders at twice the output width
        if scaler.scale_x() {
            width *= 2;
        }

        // scale_y is 6.10 fixed point: 0x400 is 1.0
        height = (height * u32::from(scaler.scale_y())) >> 10;

        // flicker-free type B interlace
        if scaler.interlace() {
            height /= 2;
        }
        (width, height)
    }

    /// Convert the displayed framebuffer to RGB888 and push it to the host if it
    /// was written directly. Returns true if a frame was pushed.
    pub fn update_framebuffer(&mut self, host: &mut dyn PvrHost) -> Result<bool, PvrError> {
        let ctrl = self.regs.fb_r_ctrl();
        let mut fields = [self.regs.get(FB_R_SOF1), self.regs.get(FB_R_SOF2)];
        let num_fields = if self.regs.spg_control().interlace() { 2 } else { 1 };
        let field = self.regs.spg_status().fieldnum() as usize;

        if !ctrl.fb_enable() {
            return Ok(false);
        }
        if !self.test_framebuffer(fields[field]) {
            return Ok(false);
        }

        let (width, height) = self.framebuffer_size();
        self.framebuffer_w = width;
        self.framebuffer_h = height;

        let size = self.regs.fb_r_size();
        // FB_R_SIZE values are in 32-bit units
        let line_mod = (i32::from(size.modulus()) << 2) - 4;
        let x_size = (u32::from(size.x()) + 1) << 2;
        let y_size = u32::from(size.y()) + 1;

        let bytes_per_pixel = match ctrl.fb_depth() {
            0 | 1 => 2,
            2 => 3,
            3 => 4,
            depth => {
                log::error!("update_framebuffer(): unexpected fb_depth {}", depth);
                return Err(PvrError::UnsupportedFramebufferDepth(depth));
            }
        };

        log::debug!(
            "update_framebuffer(): {}x{} depth:{} fields:{} sof1:{:08X} sof2:{:08X}",
            width,
            height,
            ctrl.fb_depth(),
            num_fields,
            fields[0],
            fields[1]
        );

        self.framebuffer.clear();
        for _ in 0..y_size {
            for addr in fields.iter_mut().take(num_fields) {
                let mut x = 0;
                while x < x_size {
                    let src: [u8; 4] = self.vram.read_wrapping(vram64(*addr));
                    let rgb = match ctrl.fb_depth() {
                        0 => rgb555_to_rgb888(u16::from_le_bytes([src[0], src[1]])),
                        1 => rgb565_to_rgb888(u16::from_le_bytes([src[0], src[1]])),
                        _ => [src[2], src[1], src[0]],
                    };
                    self.framebuffer.extend_from_slice(&rgb);
                    *addr = addr.wrapping_add(bytes_per_pixel);
                    x += bytes_per_pixel;
                }
                *addr = addr.wrapping_add_signed(line_mod);
            }
        }

        host.push_pixels(&self.framebuffer, width, height);
        Ok(true)
    }
}

#[inline]
fn rgb555_to_rgb888(p: u16) -> [u8; 3] {
    [
        ((p & 0x7C00) >> 7) as u8,
        ((p & 0x03E0) >> 2) as u8,
        ((p & 0x001F) << 3) as u8,
    ]
}

#[inline]
fn rgb565_to_rgb888(p: u16) -> [u8; 3] {
    [
        ((p & 0xF800) >> 8) as u8,
        ((p & 0x07E0) >> 3) as u8,
        ((p & 0x001F) << 3) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{devices::pvr::PvrConfig, machine::HollyBus};

    const FULL: u32 = 0xFFFF_FFFF;

    fn setup(regs: &[(usize, u32)]) -> (Pvr, HollyBus) {
        let mut bus = HollyBus::new();
        let mut pvr = Pvr::new(PvrConfig::default());
        pvr.init(&mut bus);
        for &(offset, value) in regs {
            pvr.reg_write(&mut bus, (offset as u32) << 2, value, FULL).unwrap();
        }
        (pvr, bus)
    }

    fn fb_r_size(x: u16, y: u16, modulus: u16) -> u32 {
        u32::from_le_bytes(FbRSize::new().with_x(x).with_y(y).with_modulus(modulus).into_bytes())
    }

    // fb_enable plus the given depth
    fn fb_r_ctrl(depth: u32) -> u32 {
        0x1 | (depth << 2)
    }

    #[test]
    fn mark_stamps_all_candidate_lines() {
        let (mut pvr, _) = setup(&[]);
        pvr.mark_framebuffer(0x0010_0000);

        assert!(!pvr.test_framebuffer(0x0010_0000));
        for offset in [640, 960, 1280, 1920, 2560, 3840, 5120] {
            assert!(!pvr.test_framebuffer(0x0010_0000 + offset), "offset {}", offset);
        }
        assert!(pvr.test_framebuffer(0x0010_0000 + 4));
    }

    #[test]
    fn mark_skips_texture_targets() {
        let (mut pvr, _) = setup(&[]);
        pvr.mark_framebuffer(0x0100_0000);
        assert!(pvr.test_framebuffer(0x0100_0000));
        assert_eq!(pvr.vram().read_u32(0).unwrap(), 0);
    }

    #[test]
    fn overwritten_cookie_is_dirty() {
        let (mut pvr, _) = setup(&[]);
        pvr.mark_framebuffer(0x200);
        assert!(!pvr.test_framebuffer(0x200));
        pvr.vram32_write(0x200, 0x0000_7FFF, 0xFFFF).unwrap();
        assert!(pvr.test_framebuffer(0x200));
    }

    #[test]
    fn framebuffer_size_by_depth() {
        let (mut pvr, mut bus) = setup(&[(FB_R_SIZE, fb_r_size(319, 239, 1))]);

        let sizes: Vec<(u32, u32)> = (0..4)
            .map(|depth| {
                pvr.reg_write(&mut bus, (FB_R_CTRL as u32) << 2, fb_r_ctrl(depth), FULL)
                    .unwrap();
                pvr.framebuffer_size()
            })
            .collect();
        assert_eq!(sizes, vec![(640, 240), (640, 240), (426, 240), (320, 240)]);

        pvr.reg_write(&mut bus, (SPG_CONTROL as u32) << 2, 0x10, FULL).unwrap();
        assert_eq!(pvr.framebuffer_size(), (320, 480));
    }

    #[test]
    fn video_size_applies_scaler() {
        let (mut pvr, mut bus) = setup(&[(FB_R_SIZE, fb_r_size(319, 479, 1)), (FB_R_CTRL, fb_r_ctrl(1))]);
        assert_eq!(pvr.video_size(), (640, 480));

        pvr.reg_write(&mut bus, (SCALER_CTL as u32) << 2, 0x0001_0400, FULL).unwrap();
        assert_eq!(pvr.video_size(), (1280, 480));

        pvr.reg_write(&mut bus, (SCALER_CTL as u32) << 2, 0x0000_0800, FULL).unwrap();
        assert_eq!(pvr.video_size(), (640, 960));

        pvr.reg_write(&mut bus, (SCALER_CTL as u32) << 2, 0x0000_0200, FULL).unwrap();
        assert_eq!(pvr.video_size(), (640, 240));

        pvr.reg_write(&mut bus, (SCALER_CTL as u32) << 2, 0x0002_0800, FULL).unwrap();
        assert_eq!(pvr.video_size(), (640, 480));
    }

    #[test]
    fn disabled_or_clean_framebuffer_is_not_pushed() {
        let (mut pvr, mut bus) = setup(&[(FB_R_SIZE, fb_r_size(1, 1, 1))]);
        assert!(!pvr.update_framebuffer(&mut bus).unwrap());

        pvr.reg_write(&mut bus, (FB_R_CTRL as u32) << 2, fb_r_ctrl(3), FULL).unwrap();
        pvr.mark_framebuffer(0);
        assert!(!pvr.update_framebuffer(&mut bus).unwrap());
        assert!(bus.take_frame().is_none());
    }

    #[test]
    fn rgb555_conversion() {
        // 2x1 pixels, one 32-bit unit wide
        let (mut pvr, mut bus) = setup(&[(FB_R_SIZE, fb_r_size(0, 0, 1)), (FB_R_CTRL, fb_r_ctrl(0))]);
        pvr.vram32_write(0, 0x03E0_7C00, FULL).unwrap();
        assert!(pvr.update_framebuffer(&mut bus).unwrap());

        let frame = bus.take_frame().unwrap();
        assert_eq!((frame.width, frame.height), (2, 1));
        assert_eq!(frame.pixels, vec![0xF8, 0x00, 0x00, 0x00, 0xF8, 0x00]);
    }

    #[test]
    fn rgb565_conversion() {
        let (mut pvr, mut bus) = setup(&[(FB_R_SIZE, fb_r_size(0, 0, 1)), (FB_R_CTRL, fb_r_ctrl(1))]);
        pvr.vram32_write(0, 0x001F_F800, FULL).unwrap();
        assert!(pvr.update_framebuffer(&mut bus).unwrap());

        let frame = bus.take_frame().unwrap();
        assert_eq!(frame.pixels, vec![0xF8, 0x00, 0x00, 0x00, 0x00, 0xF8]);

        pvr.vram32_write(0, 0x0000_07E0, FULL).unwrap();
        assert!(pvr.update_framebuffer(&mut bus).unwrap());
        let frame = bus.take_frame().unwrap();
        assert_eq!(frame.pixels[..3].to_vec(), vec![0x00, 0xFC, 0x00]);
    }

    #[test]
    fn rgb888_conversion() {
        // 3 units = 12 bytes = 4 packed pixels. Each pixel is read as 3
        // contiguous bytes from the interleaved address of its first byte.
        let (mut pvr, mut bus) = setup(&[(FB_R_SIZE, fb_r_size(2, 0, 1)), (FB_R_CTRL, fb_r_ctrl(2))]);
        for n in 0..4u32 {
            let base = vram64(n * 3);
            for k in 0..3 {
                pvr.vram64_write(base + k, n * 3 + k + 1, 0xFF).unwrap();
            }
        }
        assert!(pvr.update_framebuffer(&mut bus).unwrap());

        let frame = bus.take_frame().unwrap();
        assert_eq!((frame.width, frame.height), (4, 1));
        assert_eq!(frame.pixels, vec![3, 2, 1, 6, 5, 4, 9, 8, 7, 12, 11, 10]);
    }

    #[test]
    fn krgb0888_conversion() {
        let (mut pvr, mut bus) = setup(&[(FB_R_SIZE, fb_r_size(1, 0, 1)), (FB_R_CTRL, fb_r_ctrl(3))]);
        pvr.vram32_write(0, 0xFF11_2233, FULL).unwrap();
        pvr.vram32_write(4, 0x0044_5566, FULL).unwrap();
        assert!(pvr.update_framebuffer(&mut bus).unwrap());

        let frame = bus.take_frame().unwrap();
        assert_eq!((frame.width, frame.height), (2, 1));
        assert_eq!(frame.pixels, vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    }

    #[test]
    fn line_modulus_skips_between_rows() {
        // One pixel per row, rows 16 bytes apart: modulus 4 units -> line_mod 12
        let (mut pvr, mut bus) = setup(&[(FB_R_SIZE, fb_r_size(0, 2, 4)), (FB_R_CTRL, fb_r_ctrl(3))]);
        pvr.vram32_write(0, 0x0000_0001, FULL).unwrap();
        pvr.vram32_write(16, 0x0000_0002, FULL).unwrap();
        pvr.vram32_write(32, 0x0000_0003, FULL).unwrap();
        pvr.vram32_write(4, 0x00FF_FFFF, FULL).unwrap();
        assert!(pvr.update_framebuffer(&mut bus).unwrap());

        let frame = bus.take_frame().unwrap();
        assert_eq!((frame.width, frame.height), (1, 3));
        assert_eq!(frame.pixels, vec![0, 0, 1, 0, 0, 2, 0, 0, 3]);
    }

    #[test]
    fn interlaced_fields_alternate_rows() {
        let (mut pvr, mut bus) = setup(&[
            (FB_R_SIZE, fb_r_size(0, 1, 1)),
            (FB_R_CTRL, fb_r_ctrl(3)),
            (SPG_CONTROL, 0x10),
            (FB_R_SOF1, 0x0000_0000),
            (FB_R_SOF2, 0x0000_1000),
        ]);
        pvr.vram32_write(0x0000, 0x0000_000A, FULL).unwrap();
        pvr.vram32_write(0x0004, 0x0000_000B, FULL).unwrap();
        pvr.vram32_write(0x1000, 0x0000_00C0, FULL).unwrap();
        pvr.vram32_write(0x1004, 0x0000_00D0, FULL).unwrap();
        assert!(pvr.update_framebuffer(&mut bus).unwrap());

        let frame = bus.take_frame().unwrap();
        assert_eq!((frame.width, frame.height), (1, 4));
        assert_eq!(frame.pixels, vec![0, 0, 0x0A, 0, 0, 0xC0, 0, 0, 0x0B, 0, 0, 0xD0]);
    }

    #[test]
    fn packed_framebuffer_at_top_of_vram_wraps() {
        let (mut pvr, mut bus) = setup(&[
            (FB_R_SIZE, fb_r_size(3, 0, 1)),
            (FB_R_SOF1, 0x007F_FFF0),
            (FB_R_CTRL, fb_r_ctrl(2)),
        ]);
        // The last pixel starts on the final byte of VRAM.
        pvr.vram64_write(0x007F_FFFF, 0xCC, 0xFF).unwrap();
        pvr.vram64_write(0, 0xBBAA, 0xFFFF).unwrap();

        assert!(pvr.update_framebuffer(&mut bus).unwrap());
        let frame = bus.take_frame().unwrap();
        assert_eq!((frame.width, frame.height), (5, 1));
        assert_eq!(frame.pixels.len(), 6 * 3);
        assert_eq!(frame.pixels[..15].to_vec(), vec![0; 15]);
        assert_eq!(frame.pixels[15..].to_vec(), vec![0xBB, 0xAA, 0xCC]);
    }

    #[test]
    fn clean_display_field_suppresses_push() {
        // Field 1 is displayed and still carries its cookie, even though field 0
        // was written.
        let (mut pvr, mut bus) = setup(&[
            (FB_R_SIZE, fb_r_size(0, 0, 1)),
            (FB_R_CTRL, fb_r_ctrl(3)),
            (SPG_CONTROL, 0x10),
            (FB_R_SOF2, 0x0000_1000),
        ]);
        pvr.mark_framebuffer(0x1000);
        pvr.regs.set_spg_status(pvr.regs.spg_status().with_fieldnum(true));
        pvr.vram32_write(0, 0x0012_3456, FULL).unwrap();

        assert!(!pvr.update_framebuffer(&mut bus).unwrap());
    }
}
