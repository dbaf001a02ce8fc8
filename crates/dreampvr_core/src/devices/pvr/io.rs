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

    devices::pvr::io.rs

    Register window access for the PVR.

    Each register offset may carry a read handler, a write handler or both. A
    write handler takes over storage: it decides whether and what to store.
    Registers without handlers behave as plain storage.
*/

use super::{regs::*, Pvr, PvrError};
use crate::device_traits::pvrhost::PvrHost;

pub type RegReadFn = fn(&Pvr) -> u32;
pub type RegWriteFn = fn(&mut Pvr, &mut dyn PvrHost, u32) -> Result<(), PvrError>;

#[derive(Copy, Clone, Default)]
pub struct RegCallbacks {
    pub read: Option<RegReadFn>,
    pub write: Option<RegWriteFn>,
}

/// Per-device register callback table, fixed once the device is built.
pub struct RegisterDispatch {
    table: Vec<RegCallbacks>,
}

impl Default for RegisterDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterDispatch {
    pub fn new() -> Self {
        let dispatch = Self {
            table: vec![RegCallbacks::default(); PVR_NUM_REGS],
        };
        dispatch
            .with_write_handler(SOFTRESET, softreset_write)
            .with_write_handler(STARTRENDER, startrender_write)
            .with_write_handler(TA_LIST_INIT, ta_list_init_write)
            .with_write_handler(TA_LIST_CONT, ta_list_cont_write)
            .with_write_handler(TA_YUV_TEX_BASE, ta_yuv_tex_base_write)
            .with_write_handler(SPG_LOAD, spg_load_write)
            .with_write_handler(FB_R_CTRL, fb_r_ctrl_write)
    }

    pub fn with_read_handler(mut self, offset: usize, handler: RegReadFn) -> Self {
        self.table[offset].read = Some(handler);
        self
    }

    pub fn with_write_handler(mut self, offset: usize, handler: RegWriteFn) -> Self {
        self.table[offset].write = Some(handler);
        self
    }

    #[inline]
    pub fn get(&self, offset: usize) -> RegCallbacks {
        self.table[offset]
    }
}

impl Pvr {
    /// Read a register. `addr` is relative to the start of the register window.
    /// Reads beyond the window are open bus and return 0.
    pub fn reg_read(&self, addr: u32, _mask: u32) -> u32 {
        let offset = (addr >> 2) as usize;
        if offset >= PVR_NUM_REGS {
            log::warn!("reg_read(): open bus read at {:04X}", addr);
            return 0;
        }

        match self.dispatch.get(offset).read {
            Some(read) => read(self),
            None => self.regs.get(offset),
        }
    }

    /// Write a register. `addr` is relative to the start of the register window.
    pub fn reg_write(
        &mut self,
        host: &mut dyn PvrHost,
        addr: u32,
        data: u32,
        _mask: u32,
    ) -> Result<(), PvrError> {
        let offset = (addr >> 2) as usize;
        if offset >= PVR_NUM_REGS {
            log::warn!("reg_write(): open bus write at {:04X}: {:08X}", addr, data);
            return Ok(());
        }

        // ID is read-only. The BIOS checks it after writing to it.
        if offset == ID {
            log::trace!("reg_write(): ignored write to ID: {:08X}", data);
            return Ok(());
        }

        log::trace!("reg_write(): {} [{:04X}] <- {:08X}", reg_name(offset), addr, data);

        match self.dispatch.get(offset).write {
            Some(write) => write(self, host, data),
            None => {
                self.regs.set(offset, data);
                Ok(())
            }
        }
    }
}

fn softreset_write(_pvr: &mut Pvr, host: &mut dyn PvrHost, data: u32) -> Result<(), PvrError> {
    if data & 0x1 == 0 {
        return Ok(());
    }
    host.ta_soft_reset();
    Ok(())
}

fn startrender_write(pvr: &mut Pvr, host: &mut dyn PvrHost, data: u32) -> Result<(), PvrError> {
    if data == 0 {
        return Ok(());
    }
    host.ta_start_render();

    pvr.mark_framebuffer(pvr.regs.get(FB_W_SOF1));
    pvr.mark_framebuffer(pvr.regs.get(FB_W_SOF2));
    pvr.got_startrender = true;
    Ok(())
}

fn ta_list_init_write(_pvr: &mut Pvr, host: &mut dyn PvrHost, data: u32) -> Result<(), PvrError> {
    if data & 0x8000_0000 == 0 {
        return Ok(());
    }
    host.ta_list_init();
    Ok(())
}

fn ta_list_cont_write(_pvr: &mut Pvr, host: &mut dyn PvrHost, data: u32) -> Result<(), PvrError> {
    if data & 0x8000_0000 == 0 {
        return Ok(());
    }
    host.ta_list_cont();
    Ok(())
}

fn ta_yuv_tex_base_write(pvr: &mut Pvr, host: &mut dyn PvrHost, data: u32) -> Result<(), PvrError> {
    pvr.regs.set(TA_YUV_TEX_BASE, data);
    host.ta_yuv_init();
    Ok(())
}

fn spg_load_write(pvr: &mut Pvr, host: &mut dyn PvrHost, data: u32) -> Result<(), PvrError> {
    pvr.regs.set(SPG_LOAD, data);
    pvr.reconfigure_spg(host);
    Ok(())
}

fn fb_r_ctrl_write(pvr: &mut Pvr, host: &mut dyn PvrHost, data: u32) -> Result<(), PvrError> {
    pvr.regs.set(FB_R_CTRL, data);
    pvr.reconfigure_spg(host);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        devices::pvr::{draw::FRAMEBUFFER_COOKIE, vram::vram64, PvrConfig},
        machine::{HollyBus, TaCommand},
    };

    const FULL: u32 = 0xFFFF_FFFF;

    fn addr(offset: usize) -> u32 {
        (offset as u32) << 2
    }

    fn setup() -> (Pvr, HollyBus) {
        let mut bus = HollyBus::new();
        let mut pvr = Pvr::new(PvrConfig::default());
        pvr.init(&mut bus);
        (pvr, bus)
    }

    #[test]
    fn id_is_read_only() {
        let (mut pvr, mut bus) = setup();
        pvr.reg_write(&mut bus, addr(ID), 0x1234_5678, FULL).unwrap();
        assert_eq!(pvr.reg_read(addr(ID), FULL), 0x17FD_11DB);
        assert!(bus.ta_commands().is_empty());
    }

    #[test]
    fn plain_registers_store_verbatim() {
        let (mut pvr, mut bus) = setup();
        pvr.reg_write(&mut bus, addr(VO_BORDER_COL), 0x00FF_00FF, FULL).unwrap();
        assert_eq!(pvr.reg_read(addr(VO_BORDER_COL), FULL), 0x00FF_00FF);

        pvr.reg_write(&mut bus, addr(PALETTE_RAM_START + 5), 0xABCD, FULL).unwrap();
        assert_eq!(pvr.reg_read(addr(PALETTE_RAM_START + 5), FULL), 0xABCD);
    }

    #[test]
    fn open_bus_beyond_window() {
        let (mut pvr, mut bus) = setup();
        pvr.reg_write(&mut bus, PVR_REG_WINDOW, 0xFFFF_FFFF, FULL).unwrap();
        assert_eq!(pvr.reg_read(PVR_REG_WINDOW, FULL), 0);
        assert_eq!(pvr.reg_read(PVR_REG_WINDOW + 0x400, FULL), 0);
    }

    #[test]
    fn trigger_registers_ignore_inactive_values() {
        let (mut pvr, mut bus) = setup();

        pvr.reg_write(&mut bus, addr(SOFTRESET), 0x6, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(STARTRENDER), 0, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(TA_LIST_INIT), 0x7FFF_FFFF, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(TA_LIST_CONT), 0x1, FULL).unwrap();

        assert!(bus.ta_commands().is_empty());
        assert!(!pvr.got_startrender());
    }

    #[test]
    fn trigger_registers_forward_to_ta() {
        let (mut pvr, mut bus) = setup();

        pvr.reg_write(&mut bus, addr(SOFTRESET), 0x1, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(TA_LIST_INIT), 0x8000_0000, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(TA_LIST_CONT), 0x8000_0000, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(TA_YUV_TEX_BASE), 0x0010_0000, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(STARTRENDER), 0xFFFF_FFFF, FULL).unwrap();

        assert_eq!(
            bus.ta_commands(),
            &[
                TaCommand::SoftReset,
                TaCommand::ListInit,
                TaCommand::ListCont,
                TaCommand::YuvInit,
                TaCommand::StartRender,
            ]
        );
        assert_eq!(pvr.reg_read(addr(TA_YUV_TEX_BASE), FULL), 0x0010_0000);
        assert!(pvr.got_startrender());
    }

    #[test]
    fn startrender_marks_both_write_buffers() {
        let (mut pvr, mut bus) = setup();

        pvr.reg_write(&mut bus, addr(FB_W_SOF1), 0x0000_0000, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(FB_W_SOF2), 0x0020_0000, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(STARTRENDER), 1, FULL).unwrap();

        assert_eq!(pvr.vram().read_u32(vram64(0)).unwrap(), FRAMEBUFFER_COOKIE);
        assert_eq!(pvr.vram().read_u32(vram64(0x0020_0000)).unwrap(), FRAMEBUFFER_COOKIE);
    }

    #[test]
    fn startrender_at_top_of_vram_completes() {
        let (mut pvr, mut bus) = setup();

        pvr.reg_write(&mut bus, addr(FB_W_SOF1), 0x007F_FFFE, FULL).unwrap();
        pvr.reg_write(&mut bus, addr(STARTRENDER), 1, FULL).unwrap();

        assert_eq!(bus.ta_commands(), &[TaCommand::StartRender]);
        assert!(pvr.got_startrender());
        assert!(!pvr.test_framebuffer(0x007F_FFFE));
        // The cookie's upper half wrapped to the start of VRAM.
        assert_eq!(pvr.vram().read_u16(0).unwrap(), (FRAMEBUFFER_COOKIE >> 16) as u16);
    }

    #[test]
    fn timing_registers_reconfigure() {
        let (mut pvr, mut bus) = setup();
        let first = pvr.spg().line_timer;

        pvr.reg_write(&mut bus, addr(SPG_LOAD), 0x020C_035F, FULL).unwrap();
        assert_eq!(pvr.regs().spg_load().hcount(), 0x35F);
        assert_ne!(pvr.spg().line_timer, first);
        assert_eq!(bus.scheduler().pending(), 1);

        let second = pvr.spg().line_timer;
        pvr.reg_write(&mut bus, addr(FB_R_CTRL), 0x0080_0000, FULL).unwrap();
        assert_ne!(pvr.spg().line_timer, second);
        assert_eq!(pvr.spg().line_clock, 27_000_000 / 0x360);
        assert_eq!(bus.scheduler().pending(), 1);
    }

    fn read_magic(_pvr: &Pvr) -> u32 {
        0x5A5A_5A5A
    }

    #[test]
    fn read_handler_overrides_storage() {
        let dispatch = RegisterDispatch::new().with_read_handler(SPG_STATUS, read_magic);
        let pvr = Pvr::with_dispatch(PvrConfig::default(), dispatch);

        assert_eq!(pvr.reg_read(addr(SPG_STATUS), FULL), 0x5A5A_5A5A);
        assert_eq!(pvr.reg_read(addr(SPG_CONTROL), FULL), 0);
    }
}
