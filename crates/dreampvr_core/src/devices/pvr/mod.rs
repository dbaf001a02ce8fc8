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

    devices::pvr::mod.rs

    Implements the video output half of the Holly PVR: the register window,
    the sync pulse generator (SPG) and extraction of directly written
    framebuffers from VRAM.

    The PVR doesn't own a clock. It arms a single scanline timer through its
    PvrHost, and the machine calls next_scanline() each time that timer fires.
*/

pub mod draw;
pub mod io;
pub mod pvr_error;
pub mod regs;
pub mod spg;
pub mod vram;

use std::path::PathBuf;

use serde_derive::Deserialize;

use crate::{device_traits::pvrhost::PvrHost, tracelogger::TraceLogger};

pub use io::{RegCallbacks, RegReadFn, RegWriteFn, RegisterDispatch};
pub use pvr_error::PvrError;
use regs::RegisterFile;
use spg::SpgState;
use vram::{vram64, Vram};

const fn _default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct PvrConfig {
    /// Detect frames written straight into VRAM by the CPU, without the TA
    /// rendering them, and push them to the display at vblank.
    #[serde(default = "_default_true")]
    pub direct_write_detection: bool,
    #[serde(default)]
    pub trace_file: Option<PathBuf>,
}

impl Default for PvrConfig {
    fn default() -> Self {
        Self {
            direct_write_detection: true,
            trace_file: None,
        }
    }
}

pub struct Pvr {
    config: PvrConfig,
    regs: RegisterFile,
    dispatch: RegisterDispatch,
    vram: Vram,
    spg: SpgState,

    framebuffer: Vec<u8>,
    framebuffer_w: u32,
    framebuffer_h: u32,
    got_startrender: bool,

    trace_logger: TraceLogger,
}

impl Pvr {
    pub fn new(config: PvrConfig) -> Self {
        Self::with_dispatch(config, RegisterDispatch::new())
    }

    /// Create a PVR with a caller-supplied register dispatch table.
    pub fn with_dispatch(config: PvrConfig, dispatch: RegisterDispatch) -> Self {
        let trace_logger = TraceLogger::from_option(config.trace_file.as_ref());

        Self {
            config,
            regs: RegisterFile::new(),
            dispatch,
            vram: Vram::new(),
            spg: SpgState::default(),
            framebuffer: Vec::new(),
            framebuffer_w: 0,
            framebuffer_h: 0,
            got_startrender: false,
            trace_logger,
        }
    }

    /// Start the sync pulse generator. Must be called once before the machine
    /// starts dispatching timers.
    pub fn init(&mut self, host: &mut dyn PvrHost) {
        log::debug!("Pvr::init()");
        self.reconfigure_spg(host);
    }

    /// Return the device to its power-on state. VRAM contents survive.
    pub fn reset(&mut self, host: &mut dyn PvrHost) {
        log::debug!("Pvr::reset()");
        self.regs.load_defaults();
        if let Some(timer) = self.spg.line_timer.take() {
            host.cancel_timer(timer);
        }
        self.spg = SpgState::default();
        self.got_startrender = false;
        self.reconfigure_spg(host);
    }

    pub fn destroy(&mut self, host: &mut dyn PvrHost) {
        log::debug!("Pvr::destroy()");
        if let Some(timer) = self.spg.line_timer.take() {
            host.cancel_timer(timer);
        }
        self.trace_logger.flush();
    }

    pub fn config(&self) -> &PvrConfig {
        &self.config
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn vram(&self) -> &Vram {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut Vram {
        &mut self.vram
    }

    pub fn spg(&self) -> &SpgState {
        &self.spg
    }

    /// The last frame extracted from VRAM, as packed RGB888.
    pub fn framebuffer(&self) -> (&[u8], u32, u32) {
        (&self.framebuffer, self.framebuffer_w, self.framebuffer_h)
    }

    pub fn got_startrender(&self) -> bool {
        self.got_startrender
    }

    /// Read VRAM through the 32-bit (linear) access path.
    pub fn vram32_read(&self, addr: u32, mask: u32) -> Result<u32, PvrError> {
        self.vram.read_masked(vram64(addr), mask)
    }

    /// Write VRAM through the 32-bit (linear) access path.
    pub fn vram32_write(&mut self, addr: u32, data: u32, mask: u32) -> Result<(), PvrError> {
        self.vram.write_masked(vram64(addr), data, mask)
    }

    /// Read VRAM through the 64-bit (interleaved) access path.
    pub fn vram64_read(&self, addr: u32, mask: u32) -> Result<u32, PvrError> {
        self.vram.read_masked(addr, mask)
    }

    /// Write VRAM through the 64-bit (interleaved) access path.
    pub fn vram64_write(&mut self, addr: u32, data: u32, mask: u32) -> Result<(), PvrError> {
        self.vram.write_masked(addr, data, mask)
    }
}
