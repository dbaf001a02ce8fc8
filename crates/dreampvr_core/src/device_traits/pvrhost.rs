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

    device_traits::pvrhost.rs

    Defines the PvrHost trait, the set of services the PVR needs from the
    machine it is plugged into: the tile accelerator, the Holly interrupt
    controller, the display sink, diagnostic counters and the scheduler.
*/

use crate::{
    interrupt::HollyInterrupt,
    scheduler::{TimerHandle, TimerId},
    stats::Counter,
};

pub trait PvrHost {
    /// SOFTRESET bit 0 was written.
    fn ta_soft_reset(&mut self);
    /// STARTRENDER was written with a non-zero value.
    fn ta_start_render(&mut self);
    fn ta_list_init(&mut self);
    fn ta_list_cont(&mut self);
    fn ta_yuv_init(&mut self);

    fn raise_interrupt(&mut self, int: HollyInterrupt);

    /// The display entered vertical blank. `video_disabled` mirrors
    /// VO_CONTROL.blank_video.
    fn vblank_in(&mut self, video_disabled: bool);
    fn vblank_out(&mut self);

    /// A frame was extracted from VRAM. `pixels` is packed RGB888, row major.
    fn push_pixels(&mut self, pixels: &[u8], width: u32, height: u32);

    fn counter_add(&mut self, counter: Counter, n: u64);

    fn start_timer(&mut self, id: TimerId, delay_ns: u64) -> TimerHandle;
    fn cancel_timer(&mut self, handle: TimerHandle);
}
