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

    machine.rs

    A minimal Holly machine: the PVR plus everything it expects to find around
    it. HollyBus is the PvrHost; it latches interrupts, records TA commands,
    counts display events and keeps the last frame pushed by the PVR. Machine
    owns both and runs the timer loop.
*/

use fxhash::FxHashMap;

use crate::{
    device_traits::pvrhost::PvrHost,
    devices::pvr::{Pvr, PvrConfig, PvrError},
    interrupt::{HollyInterrupt, InterruptStatus},
    scheduler::{Scheduler, TimerHandle, TimerId},
    stats::{Counter, Counters},
};

const FULL_MASK: u32 = 0xFFFF_FFFF;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaCommand {
    SoftReset,
    StartRender,
    ListInit,
    ListCont,
    YuvInit,
}

/// A frame pushed by the PVR, packed RGB888.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Index of the vblank during which the frame was pushed.
    pub vblank: u64,
}

#[derive(Default)]
pub struct HollyBus {
    scheduler: Scheduler,
    interrupts: InterruptStatus,
    interrupt_counts: FxHashMap<HollyInterrupt, u64>,
    ta_commands: Vec<TaCommand>,
    vblank_in_count: u64,
    vblank_out_count: u64,
    last_video_disabled: Option<bool>,
    counters: Counters,
    frame: Option<Frame>,
}

impl HollyBus {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn interrupts(&self) -> &InterruptStatus {
        &self.interrupts
    }

    pub fn interrupts_mut(&mut self) -> &mut InterruptStatus {
        &mut self.interrupts
    }

    pub fn interrupt_count(&self, int: HollyInterrupt) -> u64 {
        self.interrupt_counts.get(&int).copied().unwrap_or(0)
    }

    pub fn ta_commands(&self) -> &[TaCommand] {
        &self.ta_commands
    }

    pub fn vblank_in_count(&self) -> u64 {
        self.vblank_in_count
    }

    pub fn vblank_out_count(&self) -> u64 {
        self.vblank_out_count
    }

    /// VO_CONTROL.blank_video as reported at the most recent vblank-in.
    pub fn last_video_disabled(&self) -> Option<bool> {
        self.last_video_disabled
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Take the most recently pushed frame, if one arrived since the last call.
    pub fn take_frame(&mut self) -> Option<Frame> {
        self.frame.take()
    }

    fn ta_command(&mut self, cmd: TaCommand) {
        log::debug!("TA command: {:?}", cmd);
        self.counters.add(Counter::TaCommands, 1);
        self.ta_commands.push(cmd);
    }
}

impl PvrHost for HollyBus {
    fn ta_soft_reset(&mut self) {
        self.ta_command(TaCommand::SoftReset);
    }

    fn ta_start_render(&mut self) {
        self.ta_command(TaCommand::StartRender);
    }

    fn ta_list_init(&mut self) {
        self.ta_command(TaCommand::ListInit);
    }

    fn ta_list_cont(&mut self) {
        self.ta_command(TaCommand::ListCont);
    }

    fn ta_yuv_init(&mut self) {
        self.ta_command(TaCommand::YuvInit);
    }

    fn raise_interrupt(&mut self, int: HollyInterrupt) {
        log::trace!("raise_interrupt(): {}", int);
        self.interrupts.raise(int);
        *self.interrupt_counts.entry(int).or_insert(0) += 1;
    }

    fn vblank_in(&mut self, video_disabled: bool) {
        self.vblank_in_count += 1;
        self.last_video_disabled = Some(video_disabled);
    }

    fn vblank_out(&mut self) {
        self.vblank_out_count += 1;
    }

    fn push_pixels(&mut self, pixels: &[u8], width: u32, height: u32) {
        log::debug!("push_pixels(): {}x{}", width, height);
        self.counters.add(Counter::PvrFramesPushed, 1);

        let frame = self.frame.get_or_insert_with(Frame::default);
        frame.pixels.clear();
        frame.pixels.extend_from_slice(pixels);
        frame.width = width;
        frame.height = height;
        frame.vblank = self.vblank_in_count;
    }

    fn counter_add(&mut self, counter: Counter, n: u64) {
        self.counters.add(counter, n);
    }

    fn start_timer(&mut self, id: TimerId, delay_ns: u64) -> TimerHandle {
        self.scheduler.start_timer(id, delay_ns)
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.scheduler.cancel_timer(handle);
    }
}

pub struct Machine {
    pvr: Pvr,
    bus: HollyBus,
}

impl Machine {
    /// Build a machine and start the PVR's scanline timer.
    pub fn new(config: PvrConfig) -> Self {
        Self::from_parts(Pvr::new(config), HollyBus::new())
    }

    pub fn from_parts(mut pvr: Pvr, mut bus: HollyBus) -> Self {
        pvr.init(&mut bus);
        Self { pvr, bus }
    }

    pub fn pvr(&self) -> &Pvr {
        &self.pvr
    }

    pub fn pvr_mut(&mut self) -> &mut Pvr {
        &mut self.pvr
    }

    pub fn bus(&self) -> &HollyBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut HollyBus {
        &mut self.bus
    }

    pub fn now_ns(&self) -> u64 {
        self.bus.scheduler.now_ns()
    }

    /// Full-width register write.
    pub fn reg_write(&mut self, addr: u32, data: u32) -> Result<(), PvrError> {
        self.pvr.reg_write(&mut self.bus, addr, data, FULL_MASK)
    }

    pub fn reg_read(&self, addr: u32) -> u32 {
        self.pvr.reg_read(addr, FULL_MASK)
    }

    pub fn reset(&mut self) {
        self.pvr.reset(&mut self.bus);
    }

    pub fn destroy(&mut self) {
        self.pvr.destroy(&mut self.bus);
    }

    /// Fire the next pending timer regardless of its deadline. Returns the id of
    /// the timer fired, or None if nothing is scheduled.
    pub fn step(&mut self) -> Result<Option<TimerId>, PvrError> {
        match self.bus.scheduler.next_expired(u64::MAX) {
            Some((_, id)) => {
                self.dispatch(id)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Fire every timer due at or before `until_ns`, then move time to
    /// `until_ns`.
    pub fn run_until(&mut self, until_ns: u64) -> Result<(), PvrError> {
        while let Some((_, id)) = self.bus.scheduler.next_expired(until_ns) {
            self.dispatch(id)?;
        }
        self.bus.scheduler.advance_to(until_ns);
        Ok(())
    }

    pub fn run_for(&mut self, ns: u64) -> Result<(), PvrError> {
        self.run_until(self.now_ns().saturating_add(ns))
    }

    /// Run until `n` more vblank-in notifications have reached the bus. Stops
    /// early if no timer is left to fire. Returns the number of vblanks seen.
    pub fn run_frames(&mut self, n: u64) -> Result<u64, PvrError> {
        let start = self.bus.vblank_in_count;
        let target = start + n;
        while self.bus.vblank_in_count < target {
            if self.step()?.is_none() {
                log::warn!("run_frames(): no timers pending, stopping");
                break;
            }
        }
        Ok(self.bus.vblank_in_count - start)
    }

    fn dispatch(&mut self, id: TimerId) -> Result<(), PvrError> {
        match id {
            TimerId::PvrScanline => self.pvr.next_scanline(&mut self.bus).map_err(|e| {
                if e.is_fatal() {
                    log::error!("PVR halted at {}ns: {}", self.bus.scheduler.now_ns(), e);
                }
                e
            }),
        }
    }
}
