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

    devices::pvr::spg.rs

    The sync pulse generator. Counts scanlines, raises the hblank and vblank
    interrupts programmed in SPG_HBLANK_INT / SPG_VBLANK_INT and tracks the
    vertical sync window in SPG_STATUS.
*/

use super::{Pvr, PvrError};
use crate::{
    device_traits::pvrhost::PvrHost,
    interrupt::HollyInterrupt,
    scheduler::{TimerHandle, TimerId},
    stats::Counter,
};

/// Base pixel clock. FB_R_CTRL.vclk_div selects double this rate.
pub const PIXEL_CLOCK_HZ: u32 = 13_500_000;
const NS_PER_SEC: u64 = 1_000_000_000;

#[derive(Copy, Clone, Debug, Default)]
pub struct SpgState {
    pub current_line: u32,
    /// Scanlines per second.
    pub line_clock: u32,
    pub line_timer: Option<TimerHandle>,
}

impl SpgState {
    #[inline]
    pub fn line_period_ns(&self) -> u64 {
        NS_PER_SEC / u64::from(self.line_clock.max(1))
    }
}

impl Pvr {
    /// Recalculate the line clock from the current timing registers and restart
    /// the scanline timer with the new period.
    pub fn reconfigure_spg(&mut self, host: &mut dyn PvrHost) {
        let load = self.regs.spg_load();
        let control = self.regs.spg_control();
        let hblank = self.regs.spg_hblank();
        let vblank = self.regs.spg_vblank();

        let mut pixel_clock = PIXEL_CLOCK_HZ;
        if self.regs.fb_r_ctrl().vclk_div() {
            pixel_clock *= 2;
        }

        // hcount is the number of pixel clocks per line, minus one
        self.spg.line_clock = pixel_clock / (u32::from(load.hcount()) + 1);
        if control.interlace() {
            self.spg.line_clock *= 2;
        }

        let mode = if control.ntsc() {
            "ntsc"
        }
        else if control.pal() {
            "pal"
        }
        else {
            "vga"
        };

        log::info!(
            "reconfigure_spg(): mode={} interlace={} pixel_clock={} line_clock={} \
             hcount={} hbstart={} hbend={} vcount={} vbstart={} vbend={}",
            mode,
            control.interlace(),
            pixel_clock,
            self.spg.line_clock,
            load.hcount(),
            hblank.hbstart(),
            hblank.hbend(),
            load.vcount(),
            vblank.vbstart(),
            vblank.vbend()
        );

        if let Some(timer) = self.spg.line_timer.take() {
            host.cancel_timer(timer);
        }
        self.spg.line_timer = Some(host.start_timer(TimerId::PvrScanline, self.spg.line_period_ns()));
    }

    /// Advance to the next scanline. Called by the machine when the scanline
    /// timer fires. A fatal error leaves the timer disarmed.
    pub fn next_scanline(&mut self, host: &mut dyn PvrHost) -> Result<(), PvrError> {
        // The timer that brought us here has expired.
        self.spg.line_timer = None;

        let num_lines = u32::from(self.regs.spg_load().vcount()) + 1;
        self.spg.current_line = (self.spg.current_line + 1) % num_lines;
        let line = self.spg.current_line;

        let hblank_int = self.regs.spg_hblank_int();
        match hblank_int.hblank_int_mode() {
            0 => {
                if line == u32::from(hblank_int.line_comp_val()) {
                    host.raise_interrupt(HollyInterrupt::HBlankIn);
                }
            }
            2 => host.raise_interrupt(HollyInterrupt::HBlankIn),
            mode => {
                log::error!("next_scanline(): unsupported hblank interrupt mode {}", mode);
                return Err(PvrError::UnsupportedHblankIntMode(mode));
            }
        }

        let vblank_int = self.regs.spg_vblank_int();
        if line == u32::from(vblank_int.vblank_in_line_number()) {
            host.raise_interrupt(HollyInterrupt::VBlankIn);
        }
        if line == u32::from(vblank_int.vblank_out_line_number()) {
            host.raise_interrupt(HollyInterrupt::VBlankOut);
        }

        let vblank = self.regs.spg_vblank();
        let vsync = in_vsync(line, u32::from(vblank.vbstart()), u32::from(vblank.vbend()));

        let status = self.regs.spg_status();
        let was_vsync = status.vsync();
        // line < num_lines <= 1024, so it always fits the 10-bit field
        self.regs
            .set_spg_status(status.with_vsync(vsync).with_scanline(line as u16));

        if self.trace_logger.is_some() {
            self.trace_logger.println(format!(
                "line:{:04} vsync:{} field:{}",
                line,
                vsync as u8,
                status.fieldnum() as u8
            ));
        }

        if !was_vsync && vsync {
            self.vblank_in(host)?;
        }
        else if was_vsync && !vsync {
            host.vblank_out();
        }

        self.spg.line_timer = Some(host.start_timer(TimerId::PvrScanline, self.spg.line_period_ns()));
        Ok(())
    }

    fn vblank_in(&mut self, host: &mut dyn PvrHost) -> Result<(), PvrError> {
        host.counter_add(Counter::PvrVblanks, 1);

        // If STARTRENDER wasn't written this frame, the framebuffer may have
        // been written directly.
        if self.got_startrender {
            self.got_startrender = false;
        }
        else if self.config.direct_write_detection {
            match self.update_framebuffer(host) {
                Ok(_) => {}
                Err(e) if !e.is_fatal() => {
                    log::warn!("vblank_in(): framebuffer not updated: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        let interlace = self.regs.spg_control().interlace();
        let status = self.regs.spg_status();
        let field = interlace && !status.fieldnum();
        self.regs.set_spg_status(status.with_fieldnum(field));

        host.vblank_in(self.regs.vo_control().blank_video());
        Ok(())
    }
}

/// The vertical blank window may wrap past the last line of the frame.
#[inline]
fn in_vsync(line: u32, vbstart: u32, vbend: u32) -> bool {
    if vbstart < vbend {
        line >= vbstart && line < vbend
    }
    else {
        line >= vbstart || line < vbend
    }
}
